use crate::test_helpers::factories::RecordingLease;
use crate::test_helpers::factory::Factory;

#[test]
fn test_zip_request_factory_defaults() {
    let request = Factory::zip_request().create();

    assert_eq!(request.files.len(), 3);
    assert_eq!(request.requester.name, "Ada Lovelace");
    assert!(request.lease.is_none());
}

#[test]
fn test_zip_request_factory_overrides() {
    let lease = RecordingLease::new("delivery-1");
    let request = Factory::zip_request()
        .with_keys(&["only/one.txt"])
        .with_requester(Factory::requester().with("name", "Grace Hopper").create())
        .with_lease(lease)
        .create();

    let keys: Vec<&str> = request.file_keys().collect();
    assert_eq!(keys, vec!["only/one.txt"]);
    assert_eq!(request.requester.name, "Grace Hopper");
    assert_eq!(
        request.lease.as_ref().map(|l| l.id()),
        Some("delivery-1")
    );
}
