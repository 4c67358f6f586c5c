use crate::test_helpers::factory::Factory;

#[test]
fn test_requester_factory() {
    let requester = Factory::requester()
        .with("name", "Grace Hopper")
        .with("email", "grace@example.org")
        .with("id", "req-77")
        .create();

    assert_eq!(requester.name, "Grace Hopper");
    assert_eq!(requester.email, "grace@example.org");
    assert_eq!(requester.id.as_deref(), Some("req-77"));
}

#[test]
fn test_requester_factory_defaults_have_no_id() {
    let requester = Factory::requester().create();

    assert_eq!(requester.name, "Ada Lovelace");
    assert!(requester.id.is_none());
}

#[test]
fn test_requester_factory_list_is_distinct() {
    let requesters = Factory::requester().create_list(3);

    assert_eq!(requesters.len(), 3);
    assert_ne!(requesters[0].email, requesters[2].email);
}
