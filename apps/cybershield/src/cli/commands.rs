//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::Backend;
use crate::api::{self, IncidentQuery, UserResponse};
use crate::config::Config;
use crate::error::AppError;
use cybershield_core::{
    CyberShieldError, DashboardStats, Incident, IncidentId, IncidentService, Lifecycle,
    NewIncident, Principal, ProfileUpdate, Severity, StatusChange, UserId, UserRegistration,
};
use serde::Serialize;
use std::path::PathBuf;

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub database: PathBuf,
    pub backend: Backend,
    pub config: Option<PathBuf>,
    pub acting_as: Option<String>,
    pub json_mode: bool,
}

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Open the incident service for the selected backend.
pub fn open_service(ctx: &Context) -> Result<IncidentService, AppError> {
    match ctx.backend {
        Backend::Redb => Ok(IncidentService::with_redb(&ctx.database)?),
        Backend::Memory => Ok(IncidentService::new()),
    }
}

/// Resolve `--as` to a principal.
fn acting_principal(ctx: &Context, service: &IncidentService) -> Result<Principal, AppError> {
    let id = ctx
        .acting_as
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            CyberShieldError::Validation("This command requires --as <user-id>".to_string())
        })?;
    Ok(service.principal(&UserId::new(id))?)
}

fn parse_id(raw: &str) -> Result<IncidentId, AppError> {
    Ok(raw.parse()?)
}

fn print_json<T: Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_incident(ctx: &Context, incident: &Incident) {
    if ctx.json_mode {
        print_json(incident);
        return;
    }

    println!("Incident {}", incident.id);
    println!("  Title:      {}", incident.title);
    println!("  Category:   {}", incident.category);
    println!("  Severity:   {}", incident.severity);
    println!("  Status:     {}", incident.status);
    println!("  Reporter:   {}", incident.user_id);
    println!("  Reported:   {}", incident.reported_at.to_rfc3339());
    if let Some(assignee) = &incident.assigned_to {
        println!("  Assigned:   {}", assignee);
    }
    if let Some(reference) = &incident.law_enforcement_ref {
        println!("  LE ref:     {}", reference);
    }
    if let Some(at) = incident.forwarded_at {
        println!("  Forwarded:  {}", at.to_rfc3339());
    }
    if let Some(notes) = &incident.admin_notes {
        println!("  Notes:      {}", notes);
    }
    if let (Some(by), Some(at)) = (&incident.last_updated_by, incident.last_updated_at) {
        println!("  Updated:    {} by {}", at.to_rfc3339(), by);
    }
    println!();
    println!("  {}", incident.description);
}

fn print_incident_list(ctx: &Context, incidents: &[Incident]) {
    if ctx.json_mode {
        print_json(&incidents);
        return;
    }

    if incidents.is_empty() {
        println!("No incidents.");
        return;
    }
    for incident in incidents {
        println!(
            "{}  {:<15}  {:<9}  {:<18}  {}",
            incident.id, incident.status, incident.severity, incident.category, incident.title
        );
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    ctx: &Context,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    let mut config = Config::load(ctx.config.as_deref())?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let service = open_service(ctx)?.with_recent_limit(config.dashboard.recent_limit);

    println!("CyberShield Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", config.server.host);
    println!("  Port:     {}", config.server.port);
    println!("  Backend:  {:?}", ctx.backend);
    println!("  Database: {:?}", ctx.database);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(service, config.server).await
}

// =============================================================================
// DATABASE COMMANDS
// =============================================================================

/// Initialize a new database.
pub fn cmd_init(ctx: &Context, force: bool) -> Result<(), AppError> {
    if ctx.backend == Backend::Memory {
        return Err(AppError::Config(
            "init only applies to the redb backend".to_string(),
        ));
    }
    if ctx.database.exists() {
        if !force {
            return Err(AppError::Io(
                "Database already exists. Use --force to overwrite.".to_string(),
            ));
        }
        std::fs::remove_file(&ctx.database)
            .map_err(|e| AppError::Io(format!("Cannot remove {:?}: {}", ctx.database, e)))?;
    }

    let _service = IncidentService::with_redb(&ctx.database)?;
    println!("Initialized new redb database at {:?}", ctx.database);
    Ok(())
}

/// Compact the redb database file.
pub fn cmd_compact(ctx: &Context) -> Result<(), AppError> {
    let mut service = open_service(ctx)?;
    if !service.compact()? {
        return Err(AppError::Config(
            "compact only applies to the redb backend".to_string(),
        ));
    }

    if ctx.json_mode {
        print_json(&serde_json::json!({ "compacted": ctx.database.to_string_lossy() }));
    } else {
        println!("Compacted {:?}", ctx.database);
    }
    Ok(())
}

/// Show database summary (default command).
pub fn cmd_summary(ctx: &Context) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let incidents = service.incident_count()?;
    let users = service.list_users()?.len();

    if ctx.json_mode {
        print_json(&serde_json::json!({
            "database": ctx.database.to_string_lossy(),
            "backend": format!("{:?}", ctx.backend).to_lowercase(),
            "incidents": incidents,
            "users": users,
        }));
        return Ok(());
    }

    println!("CyberShield Database");
    println!("====================");
    println!("Database:  {:?}", ctx.database);
    println!("Backend:   {:?}", ctx.backend);
    println!("Incidents: {}", incidents);
    println!("Users:     {}", users);
    Ok(())
}

/// Dashboard statistics.
pub fn cmd_stats(ctx: &Context) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let admin = acting_principal(ctx, &service)?;
    let stats: DashboardStats = service.dashboard(&admin)?;

    if ctx.json_mode {
        print_json(&stats);
        return Ok(());
    }

    println!("CyberShield Dashboard");
    println!("=====================");
    println!("Total:       {}", stats.total);
    println!("Emergency:   {}", stats.emergency);
    println!("Today:       {}", stats.incidents_today);
    println!("This week:   {}", stats.incidents_this_week);
    println!("This month:  {}", stats.incidents_this_month);
    match stats.average_resolution_minutes {
        Some(minutes) => println!("Avg resolve: {} min", minutes),
        None => println!("Avg resolve: n/a"),
    }
    println!();
    println!("By status:");
    println!("  pending          {}", stats.by_status.pending);
    println!("  reviewing        {}", stats.by_status.reviewing);
    println!("  resolved         {}", stats.by_status.resolved);
    println!("  forwarded_to_le  {}", stats.by_status.forwarded_to_le);
    println!("  closed           {}", stats.by_status.closed);
    println!();
    println!("Recent:");
    print_incident_list(ctx, &stats.recent);
    Ok(())
}

// =============================================================================
// USER COMMANDS
// =============================================================================

pub fn cmd_user_add(
    ctx: &Context,
    id: String,
    email: String,
    name: String,
    admin: bool,
    badge: Option<String>,
    department: Option<String>,
) -> Result<(), AppError> {
    let registration = if admin {
        UserRegistration::administrator(
            id,
            email,
            name,
            badge.unwrap_or_default(),
            department.unwrap_or_default(),
        )
    } else {
        UserRegistration::reporter(id, email, name)
    };

    let mut service = open_service(ctx)?;
    let user = service.register_user(registration)?;

    if ctx.json_mode {
        print_json(&UserResponse::from(user));
    } else {
        println!("Registered {} ({})", user.id, user.role.label());
    }
    Ok(())
}

pub fn cmd_user_show(ctx: &Context, id: &str) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let user = UserResponse::from(service.get_user(&UserId::new(id))?);

    if ctx.json_mode {
        print_json(&user);
        return Ok(());
    }

    println!("User {}", user.id);
    println!("  Name:    {}", user.name);
    println!("  Email:   {}", user.email);
    println!("  Role:    {}", user.role);
    if let Some(badge) = &user.badge_number {
        println!("  Badge:   {}", badge);
    }
    if let Some(department) = &user.department {
        println!("  Dept:    {}", department);
    }
    println!("  Created: {}", user.created_at);
    Ok(())
}

pub fn cmd_user_update(
    ctx: &Context,
    id: &str,
    name: Option<String>,
    email: Option<String>,
) -> Result<(), AppError> {
    let mut service = open_service(ctx)?;
    let caller = acting_principal(ctx, &service)?;
    let user = service.update_profile(&caller, &UserId::new(id), ProfileUpdate { name, email })?;
    tracing::info!(user_id = %user.id, actor = %caller.id(), "Profile updated");

    if ctx.json_mode {
        print_json(&UserResponse::from(user));
    } else {
        println!("Updated {} ({} <{}>)", user.id, user.name, user.email);
    }
    Ok(())
}

pub fn cmd_user_list(ctx: &Context) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let admin = acting_principal(ctx, &service)?;
    Lifecycle::require_admin(&admin, "list_users")?;
    let users: Vec<UserResponse> = service
        .list_users()?
        .into_iter()
        .map(UserResponse::from)
        .collect();

    if ctx.json_mode {
        print_json(&users);
        return Ok(());
    }

    println!("{} user(s)", users.len());
    for user in &users {
        println!("  {:<16} {:<6} {:<24} {}", user.id, user.role, user.name, user.email);
    }
    Ok(())
}

// =============================================================================
// INCIDENT COMMANDS
// =============================================================================

pub fn cmd_report(
    ctx: &Context,
    title: String,
    description: String,
    category: &str,
    severity: &str,
) -> Result<(), AppError> {
    let draft = NewIncident::from_labels(title, description, category, severity)?;
    let mut service = open_service(ctx)?;
    let reporter = acting_principal(ctx, &service)?;
    let incident = service.create_incident(&reporter, draft)?;
    tracing::info!(incident_id = %incident.id, actor = %reporter.id(), "Incident reported");
    print_incident(ctx, &incident);
    Ok(())
}

pub fn cmd_list(
    ctx: &Context,
    status: Option<String>,
    severity: Option<String>,
    category: Option<String>,
    search: Option<String>,
    limit: Option<usize>,
) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let caller = acting_principal(ctx, &service)?;

    let mut query = IncidentQuery {
        status,
        severity,
        category,
        search,
        limit,
        ..IncidentQuery::default()
    };
    if !caller.is_admin() {
        query.reporter = Some(caller.id().to_string());
    }
    let filter = query.into_filter()?;

    let incidents = if caller.is_admin() {
        service.list_incidents(&caller, &filter)?
    } else {
        service
            .list_reporter_incidents(caller.id())?
            .into_iter()
            .filter(|i| filter.matches(i))
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect()
    };
    print_incident_list(ctx, &incidents);
    Ok(())
}

pub fn cmd_show(ctx: &Context, id: &str) -> Result<(), AppError> {
    let service = open_service(ctx)?;
    let incident = service.view_incident_detail(parse_id(id)?)?;
    print_incident(ctx, &incident);
    Ok(())
}

pub fn cmd_escalate(ctx: &Context, id: &str) -> Result<(), AppError> {
    let id = parse_id(id)?;
    let mut service = open_service(ctx)?;
    let reporter = acting_principal(ctx, &service)?;
    let incident = service.escalate_incident(&reporter, id)?;
    tracing::info!(incident_id = %id, actor = %reporter.id(), "Incident escalated");
    print_incident(ctx, &incident);
    Ok(())
}

pub fn cmd_set_status(
    ctx: &Context,
    id: &str,
    status: &str,
    notes: Option<String>,
    assign: Option<String>,
    reference: Option<String>,
) -> Result<(), AppError> {
    let id = parse_id(id)?;
    let mut change = StatusChange::to(status.parse()?);
    if let Some(notes) = notes {
        change = change.with_notes(notes);
    }
    if let Some(assignee) = assign {
        change = change.with_assignee(UserId::new(assignee));
    }
    if let Some(reference) = reference {
        change = change.with_reference(reference);
    }

    let mut service = open_service(ctx)?;
    let admin = acting_principal(ctx, &service)?;
    let incident = service.update_status(&admin, id, change)?;
    tracing::info!(
        incident_id = %id,
        actor = %admin.id(),
        to = %incident.status,
        "Incident status updated"
    );
    print_incident(ctx, &incident);
    Ok(())
}

pub fn cmd_forward(ctx: &Context, id: &str, reference: &str) -> Result<(), AppError> {
    let id = parse_id(id)?;
    let mut service = open_service(ctx)?;
    let admin = acting_principal(ctx, &service)?;
    let incident = service.forward_to_law_enforcement(&admin, id, reference)?;
    tracing::info!(incident_id = %id, actor = %admin.id(), "Incident forwarded to law enforcement");
    print_incident(ctx, &incident);
    Ok(())
}

pub fn cmd_severity(ctx: &Context, id: &str, severity: &str) -> Result<(), AppError> {
    let id = parse_id(id)?;
    let severity: Severity = severity.parse()?;
    let mut service = open_service(ctx)?;
    let admin = acting_principal(ctx, &service)?;
    let incident = service.set_severity(&admin, id, severity)?;
    tracing::info!(incident_id = %id, actor = %admin.id(), severity = %severity, "Severity set");
    print_incident(ctx, &incident);
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn ctx(database: PathBuf, acting_as: Option<&str>) -> Context {
        Context {
            database,
            backend: Backend::Redb,
            config: None,
            acting_as: acting_as.map(String::from),
            json_mode: true,
        }
    }

    #[test]
    fn commands_share_the_redb_file() {
        let dir = tempdir().expect("tempdir");
        let db = dir.path().join("cli.db");

        cmd_init(&ctx(db.clone(), None), false).expect("init");
        cmd_user_add(
            &ctx(db.clone(), None),
            "U1".into(),
            "u1@example.com".into(),
            "Reporter".into(),
            false,
            None,
            None,
        )
        .expect("add user");
        cmd_report(
            &ctx(db.clone(), Some("U1")),
            "Phishing email".into(),
            "Received fake bank email".into(),
            "phishing",
            "low",
        )
        .expect("report");

        let service = open_service(&ctx(db, None)).expect("open");
        assert_eq!(service.incident_count().expect("count"), 1);
    }

    #[test]
    fn init_refuses_existing_database() {
        let dir = tempdir().expect("tempdir");
        let db = dir.path().join("cli.db");
        cmd_init(&ctx(db.clone(), None), false).expect("init");
        assert!(cmd_init(&ctx(db.clone(), None), false).is_err());
        assert!(cmd_init(&ctx(db, None), true).is_ok());
    }

    #[test]
    fn acting_commands_require_as() {
        let dir = tempdir().expect("tempdir");
        let err = cmd_stats(&ctx(dir.path().join("cli.db"), None)).unwrap_err();
        assert!(matches!(err, AppError::Core(CyberShieldError::Validation(_))));
    }

    #[test]
    fn user_update_and_list_through_the_cli() {
        let dir = tempdir().expect("tempdir");
        let db = dir.path().join("cli.db");
        cmd_user_add(
            &ctx(db.clone(), None),
            "A1".into(),
            "a1@agency.gov".into(),
            "Agent".into(),
            true,
            Some("B-1".into()),
            None,
        )
        .expect("add admin");
        cmd_user_add(
            &ctx(db.clone(), None),
            "U1".into(),
            "u1@example.com".into(),
            "Reporter".into(),
            false,
            None,
            None,
        )
        .expect("add reporter");

        cmd_user_update(&ctx(db.clone(), Some("U1")), "U1", Some("Jane".into()), None)
            .expect("update own profile");
        let err = cmd_user_update(&ctx(db.clone(), Some("U1")), "A1", Some("X".into()), None)
            .unwrap_err();
        assert!(matches!(err, AppError::Core(CyberShieldError::Authorization(_))));

        cmd_user_list(&ctx(db.clone(), Some("A1"))).expect("admin lists users");
        let err = cmd_user_list(&ctx(db.clone(), Some("U1"))).unwrap_err();
        assert!(matches!(err, AppError::Core(CyberShieldError::Authorization(_))));

        let service = open_service(&ctx(db, None)).expect("open");
        assert_eq!(service.get_user(&UserId::new("U1")).expect("get").name, "Jane");
    }

    #[test]
    fn compact_keeps_data_and_rejects_memory() {
        let dir = tempdir().expect("tempdir");
        let db = dir.path().join("cli.db");
        cmd_user_add(
            &ctx(db.clone(), None),
            "U1".into(),
            "u1@example.com".into(),
            "Reporter".into(),
            false,
            None,
            None,
        )
        .expect("add user");

        cmd_compact(&ctx(db.clone(), None)).expect("compact");
        let service = open_service(&ctx(db.clone(), None)).expect("open");
        assert_eq!(service.list_users().expect("users").len(), 1);

        let memory = Context {
            backend: Backend::Memory,
            ..ctx(db, None)
        };
        assert!(matches!(cmd_compact(&memory), Err(AppError::Config(_))));
    }
}
