use rotaguard_core::db::open_db_in_memory;
use rotaguard_core::{
    AuthService, RoleRepository, RoleService, ServiceError, SqliteRoleRepository,
    SqliteUserRepository, User, UserId, UserRepository, UserService,
};
use rusqlite::Connection;

fn seed_user(conn: &mut Connection, email: &str, name: &str) -> User {
    SqliteUserRepository::new(conn)
        .create_user(User::new(email, "stored-hash", name))
        .unwrap()
}

#[test]
fn register_creates_user_with_manager_role() {
    let mut conn = open_db_in_memory().unwrap();
    let mut auth = AuthService::new(SqliteUserRepository::new(&mut conn));

    let registration = auth
        .register("test@example.com", "password123", "Test User")
        .unwrap();

    assert_eq!(registration.user.email, "test@example.com");
    assert_eq!(registration.user.meta.human_id, Some(1));
    assert_eq!(registration.role.name, "manager");
    assert_ne!(registration.user.password_hash, "password123");
    assert!(registration.user.password_hash.starts_with("$argon2"));
    drop(auth);

    let roles = UserService::new(SqliteUserRepository::new(&mut conn))
        .user_roles(registration.user.meta.id)
        .unwrap();
    assert_eq!(roles, vec![registration.role]);
}

#[test]
fn register_reuses_seeded_manager_role() {
    let mut conn = open_db_in_memory().unwrap();
    RoleService::new(SqliteRoleRepository::new(&mut conn))
        .seed_default_roles()
        .unwrap();

    let registration = AuthService::new(SqliteUserRepository::new(&mut conn))
        .register("boss@example.com", "secret", "Boss")
        .unwrap();

    assert_eq!(registration.role.name, "Manager");
    assert_eq!(registration.role.meta.human_id, Some(1));
    assert_eq!(
        SqliteRoleRepository::new(&mut conn).list_roles().unwrap().len(),
        5
    );
}

#[test]
fn register_rejects_duplicate_email_without_consuming_a_value() {
    let mut conn = open_db_in_memory().unwrap();
    let mut auth = AuthService::new(SqliteUserRepository::new(&mut conn));

    auth.register("test@example.com", "password123", "Test User")
        .unwrap();
    let err = auth
        .register("TEST@example.com", "password123", "Another User")
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));

    let next = auth
        .register("other@example.com", "password123", "Other")
        .unwrap();
    assert_eq!(next.user.meta.human_id, Some(2));
}

#[test]
fn register_reports_every_missing_field() {
    let mut conn = open_db_in_memory().unwrap();
    let mut auth = AuthService::new(SqliteUserRepository::new(&mut conn));

    let err = auth.register("test@example.com", "", " ").unwrap_err();
    match err {
        ServiceError::MissingFields(fields) => assert_eq!(fields, vec!["password", "name"]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn register_rejects_malformed_email() {
    let mut conn = open_db_in_memory().unwrap();
    let mut auth = AuthService::new(SqliteUserRepository::new(&mut conn));

    assert!(matches!(
        auth.register("not-an-email", "password123", "Test User"),
        Err(ServiceError::InvalidInput(_))
    ));
}

#[test]
fn login_accepts_valid_credentials_and_rejects_the_rest() {
    let mut conn = open_db_in_memory().unwrap();
    let mut auth = AuthService::new(SqliteUserRepository::new(&mut conn));
    let registered = auth
        .register("test@example.com", "password123", "Test User")
        .unwrap()
        .user;

    let logged_in = auth.login("test@example.com", "password123").unwrap();
    assert_eq!(logged_in.meta.id, registered.meta.id);

    assert!(matches!(
        auth.login("test@example.com", "wrong"),
        Err(ServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("nobody@example.com", "password123"),
        Err(ServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        auth.login("test@example.com", ""),
        Err(ServiceError::MissingFields(ref fields)) if fields == &["password"]
    ));
}

#[test]
fn assign_roles_replaces_existing_links() {
    let mut conn = open_db_in_memory().unwrap();
    RoleService::new(SqliteRoleRepository::new(&mut conn))
        .seed_default_roles()
        .unwrap();
    let user = seed_user(&mut conn, "staff@example.com", "Staff");
    let mut users = UserService::new(SqliteUserRepository::new(&mut conn));

    let first = users
        .assign_roles(user.meta.id, &names(&["Chef", "Waiter"]), None)
        .unwrap();
    assert_eq!(role_names(&first), vec!["Chef", "Waiter"]);

    let second = users
        .assign_roles(user.meta.id, &names(&["bar staff", "BAR STAFF"]), None)
        .unwrap();
    assert_eq!(role_names(&second), vec!["Bar staff"]);
    assert_eq!(
        role_names(&users.user_roles(user.meta.id).unwrap()),
        vec!["Bar staff"]
    );

    assert!(users.assign_roles(user.meta.id, &[], None).unwrap().is_empty());
    assert!(users.user_roles(user.meta.id).unwrap().is_empty());
}

#[test]
fn assign_roles_with_unknown_name_changes_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    RoleService::new(SqliteRoleRepository::new(&mut conn))
        .seed_default_roles()
        .unwrap();
    let user = seed_user(&mut conn, "staff@example.com", "Staff");
    let mut users = UserService::new(SqliteUserRepository::new(&mut conn));
    users
        .assign_roles(user.meta.id, &names(&["Chef"]), None)
        .unwrap();

    let err = users
        .assign_roles(user.meta.id, &names(&["Waiter", "Juggler"]), None)
        .unwrap_err();
    match err {
        ServiceError::RolesNotFound(missing) => assert_eq!(missing, vec!["Juggler"]),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        role_names(&users.user_roles(user.meta.id).unwrap()),
        vec!["Chef"]
    );

    assert!(matches!(
        users.assign_roles(user.meta.id, &names(&[" "]), None),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        users.assign_roles(uuid::Uuid::new_v4(), &names(&["Chef"]), None),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn assign_roles_keeps_names_differing_only_in_non_ascii_case() {
    let mut conn = open_db_in_memory().unwrap();
    let mut roles = RoleService::new(SqliteRoleRepository::new(&mut conn));
    let upper = roles.create_role("Éclair", None).unwrap();
    let lower = roles.create_role("éclair", None).unwrap();
    assert_ne!(upper.meta.id, lower.meta.id);
    drop(roles);

    let user = seed_user(&mut conn, "pastry@example.com", "Pastry");
    let mut users = UserService::new(SqliteUserRepository::new(&mut conn));
    // ASCII letters fold, so `ÉCLAIR` resolves to `Éclair` and is deduped.
    let assigned = users
        .assign_roles(user.meta.id, &names(&["Éclair", "éclair", "ÉCLAIR"]), None)
        .unwrap();
    assert_eq!(role_names(&assigned), vec!["Éclair", "éclair"]);
    assert_eq!(
        role_names(&users.user_roles(user.meta.id).unwrap()),
        vec!["Éclair", "éclair"]
    );
}

#[test]
fn manager_hierarchy_tracks_direct_reports_and_rejects_cycles() {
    let mut conn = open_db_in_memory().unwrap();
    let boss = seed_user(&mut conn, "boss@example.com", "Boss");
    let lead = seed_user(&mut conn, "lead@example.com", "Lead");
    let cook = seed_user(&mut conn, "cook@example.com", "Cook");
    let mut users = UserService::new(SqliteUserRepository::new(&mut conn));

    let actor: Option<UserId> = Some(boss.meta.id);
    let lead = users
        .set_manager(lead.meta.id, Some(boss.meta.id), actor)
        .unwrap();
    assert_eq!(lead.manager_id, Some(boss.meta.id));
    assert_eq!(lead.meta.last_updated_by_id, actor);
    users
        .set_manager(cook.meta.id, Some(lead.meta.id), actor)
        .unwrap();

    let reports: Vec<_> = users
        .direct_reports(boss.meta.id)
        .unwrap()
        .into_iter()
        .map(|user| user.name)
        .collect();
    assert_eq!(reports, vec!["Lead"]);

    assert!(matches!(
        users.set_manager(boss.meta.id, Some(cook.meta.id), actor),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        users.set_manager(boss.meta.id, Some(boss.meta.id), actor),
        Err(ServiceError::InvalidInput(_))
    ));

    let cleared = users.set_manager(cook.meta.id, None, actor).unwrap();
    assert_eq!(cleared.manager_id, None);
    assert!(users.direct_reports(lead.meta.id).unwrap().is_empty());
}

#[test]
fn deleting_manager_clears_reports_and_keeps_counter() {
    let mut conn = open_db_in_memory().unwrap();
    let boss = seed_user(&mut conn, "boss@example.com", "Boss");
    let lead = seed_user(&mut conn, "lead@example.com", "Lead");
    let mut users = UserService::new(SqliteUserRepository::new(&mut conn));
    users
        .set_manager(lead.meta.id, Some(boss.meta.id), None)
        .unwrap();

    users.delete_user(boss.meta.id).unwrap();
    assert!(matches!(
        users.get_user(boss.meta.id),
        Err(ServiceError::NotFound { .. })
    ));
    assert_eq!(users.get_user(lead.meta.id).unwrap().manager_id, None);
    drop(users);

    let next = seed_user(&mut conn, "new@example.com", "New");
    assert_eq!(next.meta.human_id, Some(3));
}

fn names(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn role_names(roles: &[rotaguard_core::Role]) -> Vec<&str> {
    roles.iter().map(|role| role.name.as_str()).collect()
}
