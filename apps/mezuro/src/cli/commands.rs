//! # CLI Command Implementations

use super::CliError;
use crate::api::{self, AppState};
use crate::collector;
use crate::config::{AppConfig, Backend, CollectorsConfig, DatabaseConfig};
use mezuro_core::{
    Catalog, NewKalibroConfiguration, NewReading, NewReadingGroup, ReadingGroupId, User,
    reading_group_owner,
};
use serde_json::{Value, json};

// =============================================================================
// HELPERS
// =============================================================================

/// Open the catalog described by `db`.
pub fn open_catalog(db: &DatabaseConfig) -> Result<Catalog, CliError> {
    match db.backend {
        Backend::Redb => Ok(Catalog::with_redb(&db.path)?),
        Backend::Memory => {
            tracing::warn!("Using the in-memory backend: nothing will be persisted");
            Ok(Catalog::new())
        }
    }
}

fn backend_name(db: &DatabaseConfig) -> &'static str {
    match db.backend {
        Backend::Redb => "redb",
        Backend::Memory => "memory",
    }
}

fn print_json(value: &Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn owner_by_email(catalog: &Catalog, email: &str) -> Result<User, CliError> {
    catalog
        .user_by_email(email)?
        .ok_or_else(|| CliError::Usage(format!("No user with email '{email}'")))
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &AppConfig) -> Result<(), CliError> {
    let catalog = open_catalog(&config.database)?;
    let collectors = collector::from_config(&config.collectors)?;
    let state = AppState::new(catalog, collectors);

    println!("Mezuro Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:       {}", config.server.host);
    println!("  Port:       {}", config.server.port);
    println!("  Backend:    {}", backend_name(&config.database));
    println!("  Database:   {}", config.database.path.display());
    println!(
        "  Collectors: {}",
        config
            .collectors
            .processor_url
            .as_deref()
            .unwrap_or("static list")
    );
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    api::run_server(&addr, state, &config.security).await?;
    Ok(())
}

// =============================================================================
// DATABASE COMMANDS
// =============================================================================

/// Create an empty database.
pub fn cmd_init(db: &DatabaseConfig, force: bool) -> Result<(), CliError> {
    if db.backend == Backend::Memory {
        println!("The memory backend needs no initialization");
        return Ok(());
    }
    if db.path.exists() {
        if !force {
            return Err(CliError::Usage(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&db.path)?;
    }
    Catalog::with_redb(&db.path)?;
    println!("Initialized new redb database at {}", db.path.display());
    Ok(())
}

/// Show record counts.
pub fn cmd_status(db: &DatabaseConfig, json_mode: bool) -> Result<(), CliError> {
    let counts = open_catalog(db)?.counts()?;

    if json_mode {
        print_json(&json!({
            "database": db.path.to_string_lossy(),
            "backend": backend_name(db),
            "users": counts.users,
            "kalibro_configurations": counts.kalibro_configurations,
            "reading_groups": counts.reading_groups,
            "readings": counts.readings,
            "metric_configurations": counts.metric_configurations,
            "mezuro_ranges": counts.mezuro_ranges,
        }));
        return Ok(());
    }

    println!("Mezuro Catalog Status");
    println!("=====================");
    println!("Database: {}", db.path.display());
    println!("Backend:  {}", backend_name(db));
    println!();
    println!("Users:                  {}", counts.users);
    println!("Kalibro Configurations: {}", counts.kalibro_configurations);
    println!("Reading Groups:         {}", counts.reading_groups);
    println!("Readings:               {}", counts.readings);
    println!("Metric Configurations:  {}", counts.metric_configurations);
    println!("Ranges:                 {}", counts.mezuro_ranges);
    Ok(())
}

/// Compact the database file.
pub fn cmd_compact(db: &DatabaseConfig) -> Result<(), CliError> {
    let compacted = open_catalog(db)?.compact()?;
    if compacted {
        println!("Compacted {}", db.path.display());
    } else {
        println!("Nothing to compact");
    }
    Ok(())
}

/// List metric collectors and their metrics.
pub async fn cmd_collectors(config: &CollectorsConfig, json_mode: bool) -> Result<(), CliError> {
    let collectors = collector::from_config(config)?.all().await?;

    if json_mode {
        print_json(&json!({ "metric_collectors": collectors }));
        return Ok(());
    }
    if collectors.is_empty() {
        println!("No metric collectors configured");
    }
    for c in &collectors {
        println!("{} ({} metrics)", c.name, c.supported_metrics.len());
        for metric in c.supported_metrics.values() {
            println!("  {:<12} {} [{}]", metric.code, metric.name, metric.scope);
        }
    }
    Ok(())
}

// =============================================================================
// RECORD COMMANDS
// =============================================================================

/// Register a user and print the token once.
pub fn cmd_user_add(
    db: &DatabaseConfig,
    name: &str,
    email: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let (user, token) = open_catalog(db)?.create_user(name, email)?;

    if json_mode {
        print_json(&json!({ "id": user.id, "email": user.email, "token": token }));
    } else {
        println!("Created user {} <{}> (id {})", user.name, user.email, user.id);
        println!("Token: {token}");
        println!("The token is not stored and cannot be shown again.");
    }
    Ok(())
}

pub fn cmd_configuration_add(
    db: &DatabaseConfig,
    owner_email: &str,
    name: &str,
    description: &str,
    public: bool,
    json_mode: bool,
) -> Result<(), CliError> {
    let mut catalog = open_catalog(db)?;
    let owner = owner_by_email(&catalog, owner_email)?;
    let configuration = catalog.create_kalibro_configuration(NewKalibroConfiguration {
        name: name.trim().to_string(),
        description: description.to_string(),
        owner: owner.id,
        public,
    })?;

    if json_mode {
        print_json(&json!(configuration));
    } else {
        println!(
            "Created kalibro configuration '{}' (id {})",
            configuration.name, configuration.id
        );
    }
    Ok(())
}

pub fn cmd_configuration_list(db: &DatabaseConfig, json_mode: bool) -> Result<(), CliError> {
    let configurations = open_catalog(db)?.kalibro_configurations()?;

    if json_mode {
        print_json(&json!(configurations));
        return Ok(());
    }
    for c in &configurations {
        let visibility = if c.public { "public" } else { "private" };
        println!("{:>4}  {}  ({}, owner {})", c.id, c.name, visibility, c.owner);
    }
    Ok(())
}

pub fn cmd_reading_group_add(
    db: &DatabaseConfig,
    owner_email: &str,
    name: &str,
    description: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let mut catalog = open_catalog(db)?;
    let owner = owner_by_email(&catalog, owner_email)?;
    let group = catalog.create_reading_group(NewReadingGroup {
        name: name.trim().to_string(),
        description: description.to_string(),
        owner: owner.id,
    })?;

    if json_mode {
        print_json(&json!(group));
    } else {
        println!("Created reading group '{}' (id {})", group.name, group.id);
    }
    Ok(())
}

pub fn cmd_reading_group_list(db: &DatabaseConfig, json_mode: bool) -> Result<(), CliError> {
    let groups = open_catalog(db)?.reading_groups()?;

    if json_mode {
        print_json(&json!(groups));
        return Ok(());
    }
    for g in &groups {
        println!("{:>4}  {}  (owner {})", g.id, g.name, g.owner);
    }
    Ok(())
}

/// Add a reading; only the reading group's owner may.
pub fn cmd_reading_add(
    db: &DatabaseConfig,
    owner_email: &str,
    group: u64,
    label: &str,
    grade: f64,
    color: &str,
    json_mode: bool,
) -> Result<(), CliError> {
    let mut catalog = open_catalog(db)?;
    let owner = owner_by_email(&catalog, owner_email)?;
    let group = ReadingGroupId(group);
    if !reading_group_owner(&catalog, &owner, group)? {
        return Err(CliError::Usage(format!(
            "'{owner_email}' does not own reading group {group}"
        )));
    }

    let reading = catalog.create_reading(NewReading {
        reading_group_id: group,
        label: label.trim().to_string(),
        grade,
        color: color.trim().to_string(),
    })?;

    if json_mode {
        print_json(&json!(reading));
    } else {
        println!(
            "Created reading '{}' (id {}, grade {}, #{})",
            reading.label, reading.id, reading.grade, reading.color
        );
    }
    Ok(())
}

pub fn cmd_reading_list(db: &DatabaseConfig, group: u64, json_mode: bool) -> Result<(), CliError> {
    let readings = open_catalog(db)?.readings_of(ReadingGroupId(group))?;

    if json_mode {
        print_json(&json!(readings));
        return Ok(());
    }
    for r in &readings {
        println!("{:>4}  {:<12} {:>8}  #{}", r.id, r.label, r.grade, r.color);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
