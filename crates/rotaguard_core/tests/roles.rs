use rotaguard_core::db::open_db_in_memory;
use rotaguard_core::model::role::DEFAULT_ROLE_NAMES;
use rotaguard_core::{
    peek_next_value, RoleService, ServiceError, SqliteRoleRepository, SqliteUserRepository, User,
    UserRepository,
};

#[test]
fn list_roles_is_empty_on_fresh_database() {
    let mut conn = open_db_in_memory().unwrap();
    let service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    assert!(service.list_roles().unwrap().is_empty());
}

#[test]
fn create_role_returns_ids_and_round_trips_by_id() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    let created = service.create_role("  Test Role  ", None).unwrap();
    assert_eq!(created.name, "Test Role");
    assert_eq!(created.meta.human_id, Some(1));

    let fetched = service.get_role_str(&created.meta.id.to_string()).unwrap();
    assert_eq!(fetched, created);
}

#[test]
fn create_role_without_name_reports_missing_field() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    let err = service.create_role("   ", None).unwrap_err();
    assert!(matches!(err, ServiceError::MissingFields(ref fields) if fields == &["name"]));
    drop(service);

    assert_eq!(peek_next_value(&conn, "role").unwrap(), None);
}

#[test]
fn duplicate_role_name_is_a_conflict_regardless_of_case() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    service.create_role("Chef", None).unwrap();
    let err = service.create_role("CHEF", None).unwrap_err();
    assert!(matches!(err, ServiceError::Conflict(_)));
}

#[test]
fn get_role_rejects_malformed_and_unknown_ids() {
    let mut conn = open_db_in_memory().unwrap();
    let service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    assert!(matches!(
        service.get_role_str("invalid-id"),
        Err(ServiceError::InvalidInput(_))
    ));
    assert!(matches!(
        service.get_role_str(&uuid::Uuid::new_v4().to_string()),
        Err(ServiceError::NotFound { .. })
    ));
}

#[test]
fn seeding_default_roles_is_idempotent() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    let created = service.seed_default_roles().unwrap();
    assert_eq!(created, DEFAULT_ROLE_NAMES.map(str::to_string).to_vec());
    assert!(service.seed_default_roles().unwrap().is_empty());

    let human_ids: Vec<_> = service
        .list_roles()
        .unwrap()
        .into_iter()
        .map(|role| role.meta.human_id.unwrap())
        .collect();
    assert_eq!(human_ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn seeding_skips_roles_that_already_exist() {
    let mut conn = open_db_in_memory().unwrap();
    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));

    service.create_role("waiter", None).unwrap();
    let created = service.seed_default_roles().unwrap();

    assert_eq!(created.len(), DEFAULT_ROLE_NAMES.len() - 1);
    assert!(!created.iter().any(|name| name == "Waiter"));
}

#[test]
fn deleting_role_unlinks_users_and_keeps_counter() {
    let mut conn = open_db_in_memory().unwrap();
    let (user, role) = SqliteUserRepository::new(&mut conn)
        .create_user_with_role(User::new("chef@example.com", "pw", "Chef"), "Chef")
        .unwrap();

    let mut service = RoleService::new(SqliteRoleRepository::new(&mut conn));
    service.delete_role(role.meta.id).unwrap();
    assert!(matches!(
        service.delete_role(role.meta.id),
        Err(ServiceError::NotFound { .. })
    ));
    let next = service.create_role("Chef", None).unwrap();
    assert_eq!(next.meta.human_id, Some(2));
    drop(service);

    let roles = SqliteUserRepository::new(&mut conn)
        .list_user_roles(user.meta.id)
        .unwrap();
    assert!(roles.is_empty());
}
