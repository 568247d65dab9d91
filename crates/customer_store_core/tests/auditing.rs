use customer_store_core::{
    open_db_in_memory, AuditorAware, AuditorId, AuditorTracker, Customer, CustomerProbe, CustomerService, RepoError,
    SqliteCustomerRepository,
};

#[test]
fn creator_and_modifier_are_tracked_separately() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let mut service = CustomerService::new(repo);

    service.set_current_auditor("Peter");
    let mut customer = service.save(&Customer::new("Bob", "Smith")).unwrap();
    assert_eq!(customer.created_by(), Some("Peter"));
    assert_eq!(customer.last_modified_by(), Some("Peter"));

    service.set_current_auditor("Jhon");
    customer.first_name = "Bob Modified".to_string();
    let updated = service.save(&customer).unwrap();

    assert_eq!(updated.created_by(), Some("Peter"));
    assert_eq!(updated.last_modified_by(), Some("Jhon"));
    assert_eq!(updated.version(), Some(1));
    assert_eq!(updated.first_name, "Bob Modified");
}

#[test]
fn unset_auditor_leaves_audit_identities_empty() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let service = CustomerService::new(repo);

    assert_eq!(service.current_auditor(), None);
    let saved = service.save(&Customer::new("Alice", "Smith")).unwrap();

    assert_eq!(saved.created_by(), None);
    assert_eq!(saved.last_modified_by(), None);
    assert_eq!(saved.version(), Some(0));
}

#[test]
fn clearing_auditor_stamps_updates_as_anonymous() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let mut service = CustomerService::with_auditor(repo, AuditorTracker::acting_as("Peter"));

    let saved = service.save(&Customer::new("Alice", "Smith")).unwrap();
    service.clear_current_auditor();
    let updated = service.save(&saved).unwrap();

    assert_eq!(updated.created_by(), Some("Peter"));
    assert_eq!(updated.last_modified_by(), None);
}

#[test]
fn separate_services_keep_separate_auditor_contexts() {
    let conn = open_db_in_memory().unwrap();
    let peter = CustomerService::with_auditor(
        SqliteCustomerRepository::try_new(&conn).unwrap(),
        AuditorTracker::acting_as("Peter"),
    );
    let jhon = CustomerService::with_auditor(
        SqliteCustomerRepository::try_new(&conn).unwrap(),
        AuditorTracker::acting_as("Jhon"),
    );

    let created = peter.save(&Customer::new("Alice", "Smith")).unwrap();
    let updated = jhon.save(&created).unwrap();

    assert_eq!(updated.created_by(), Some("Peter"));
    assert_eq!(updated.last_modified_by(), Some("Jhon"));
    assert_eq!(peter.current_auditor().as_deref(), Some("Peter"));
}

#[test]
fn probe_filters_by_auditor_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let mut service = CustomerService::new(repo);

    service.set_current_auditor("Peter");
    let alice = service.save(&Customer::new("Alice", "Smith")).unwrap();
    service.save(&Customer::new("Bob", "Smith")).unwrap();

    service.set_current_auditor("Jhon");
    service.save(&alice).unwrap();

    let touched_by_jhon = service
        .find_all_by_example(&CustomerProbe::new().with_last_modified_by("Jhon"))
        .unwrap();
    assert_eq!(touched_by_jhon.len(), 1);
    assert_eq!(touched_by_jhon[0].first_name, "Alice");

    let created_by_peter = service
        .find_all_by_example(&CustomerProbe::new().with_created_by("Peter"))
        .unwrap();
    assert_eq!(created_by_peter.len(), 2);
}

#[test]
fn service_surfaces_repository_errors_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let service = CustomerService::new(repo);

    let saved = service.save(&Customer::new("Alice", "Smith")).unwrap();
    service.delete(saved.id().unwrap()).unwrap();

    assert!(matches!(
        service.save(&saved).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert!(matches!(
        service.delete(saved.id().unwrap()).unwrap_err(),
        RepoError::NotFound(_)
    ));
    assert_eq!(service.count().unwrap(), 0);
}

#[test]
fn end_to_end_scenario_matches_expected_state() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let mut service = CustomerService::new(repo);

    service.set_current_auditor("Peter");
    service.save(&Customer::new("Alice", "Smith")).unwrap();
    let mut bob = service.save(&Customer::new("Bob", "Smith")).unwrap();

    service.set_current_auditor("Jhon");
    bob.first_name = "Bob Modified".to_string();
    let bob = service.save(&bob).unwrap();

    assert_eq!(service.find_all().unwrap().len(), 2);
    assert_eq!(service.find_by_first_name("Alice").unwrap().len(), 1);
    assert_eq!(service.find_by_last_name("Smith").unwrap().len(), 2);

    let unmodified = service.find_unmodified_customers().unwrap();
    assert_eq!(unmodified.len(), 1);
    assert_eq!(unmodified[0].first_name, "Alice");
    assert_eq!(service.find_by_id(bob.id().unwrap()).unwrap(), Some(bob));

    assert_eq!(service.delete_all().unwrap(), 2);
    assert!(service.find_all().unwrap().is_empty());
}

struct SessionUser(&'static str);

impl AuditorAware for SessionUser {
    fn current_auditor(&self) -> Option<AuditorId> {
        Some(self.0.to_string())
    }
}

#[test]
fn service_reads_auditor_from_any_auditor_source() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCustomerRepository::try_new(&conn).unwrap();
    let service = CustomerService::with_auditor(repo, SessionUser("session-42"));

    assert_eq!(service.current_auditor().as_deref(), Some("session-42"));
    let saved = service.save(&Customer::new("Alice", "Smith")).unwrap();
    assert_eq!(saved.created_by(), Some("session-42"));
    assert_eq!(saved.last_modified_by(), Some("session-42"));
}
