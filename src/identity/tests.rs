use super::{NodeIdentifier, PublisherIdentifier, SubscriberRecord, TopicDefinition};
use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn node(name: &str, uri: &str) -> NodeIdentifier {
    NodeIdentifier::parse(name, uri).unwrap()
}

fn string_topic(name: &str) -> TopicDefinition {
    TopicDefinition::new(name, "std_msgs/String")
}

#[test]
fn test_node_identifier_structural_equality() {
    let a = node("/talker", "ws://127.0.0.1:4000");
    let b = node("/talker", "ws://127.0.0.1:4000");
    let c = node("/talker", "ws://127.0.0.1:4001");

    assert_eq!(a, a);
    assert_eq!(a, b);
    assert_eq!(b, a);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, c);
}

#[test]
fn test_topic_definition_structural_equality() {
    let a = string_topic("/foo");
    let b = string_topic("/foo");
    let other_type = TopicDefinition::new("/foo", "std_msgs/Int32");

    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&b));
    assert_ne!(a, other_type);
}

#[test]
fn test_publisher_identifier_requires_both_components() {
    let a = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    let same = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    let other_node = PublisherIdentifier::new(node("/b", "ws://127.0.0.1:4000"), string_topic("/foo"));
    let other_topic = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/bar"));

    assert_eq!(a, same);
    assert_eq!(same, a);
    assert_eq!(hash_of(&a), hash_of(&same));
    assert_ne!(a, other_node);
    assert_ne!(a, other_topic);
}

#[test]
fn test_publisher_identifier_absent_components() {
    let present = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    let no_node = PublisherIdentifier::from_parts(None, Some(string_topic("/foo")));
    let no_node_again = PublisherIdentifier::from_parts(None, Some(string_topic("/foo")));
    let empty = PublisherIdentifier::from_parts(None, None);

    assert_eq!(no_node, no_node_again);
    assert_eq!(hash_of(&no_node), hash_of(&no_node_again));
    assert_ne!(no_node, present);
    assert_ne!(present, no_node);
    assert_eq!(empty, PublisherIdentifier::from_parts(None, None));
    assert_ne!(empty, no_node);
    assert!(!no_node.is_complete());
    assert!(present.is_complete());
}

#[test]
fn test_publisher_identifier_transitive_in_sets() {
    let a = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    let b = a.clone();
    let c = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    assert!(a == b && b == c && a == c);

    let set: HashSet<_> = [a, b, c].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[test]
fn test_publisher_identifier_display() {
    let id = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    assert_eq!(
        id.to_string(),
        "PublisherIdentifier<SlaveIdentifier</a, ws://127.0.0.1:4000/>, TopicDefinition</foo, std_msgs/String>>"
    );

    let partial = PublisherIdentifier::from_parts(None, Some(string_topic("/foo")));
    assert_eq!(
        partial.to_string(),
        "PublisherIdentifier<none, TopicDefinition</foo, std_msgs/String>>"
    );
}

#[test]
fn test_publisher_identifier_accessors() {
    let id = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));
    assert_eq!(id.node_name(), Some("/a"));
    assert_eq!(id.topic_name(), Some("/foo"));
    assert_eq!(id.node_uri().map(|u| u.port()), Some(Some(4000)));
}

#[test]
fn test_publisher_identifier_missing_fields_decode_as_absent() {
    let json = r#"{"topic":{"name":"/foo","message_type":"std_msgs/String"}}"#;
    let id: PublisherIdentifier = serde_json::from_str(json).unwrap();
    assert!(id.node().is_none());
    assert_eq!(id, PublisherIdentifier::from_parts(None, Some(string_topic("/foo"))));
}

#[test]
fn test_subscriber_record_tracks_connections() {
    let mut record = SubscriberRecord::new(node("/listener", "ws://127.0.0.1:5000"), string_topic("/foo"));
    let publisher = PublisherIdentifier::new(node("/a", "ws://127.0.0.1:4000"), string_topic("/foo"));

    assert!(record.is_empty());
    assert!(record.add(publisher.clone()));
    assert!(!record.add(publisher.clone()));
    assert_eq!(record.len(), 1);
    assert!(record.is_connected(&publisher));

    assert!(record.remove(&publisher));
    assert!(!record.remove(&publisher));
    assert!(record.is_empty());
}
