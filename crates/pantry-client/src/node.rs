//! Nodes and their attribute trees.

use serde::Deserialize;
use serde_json::Value;

use crate::attributes::{Attribute, AttributeTree};
use crate::error::ClientResult;
use crate::json;

fn default_environment() -> String {
    "_default".to_string()
}

#[derive(Debug, Deserialize)]
struct NodeDoc {
    name: String,
    #[serde(default = "default_environment")]
    chef_environment: String,
    #[serde(default)]
    run_list: Vec<String>,
    #[serde(default)]
    default: Value,
    #[serde(default)]
    normal: Value,
    #[serde(default, rename = "override")]
    override_attrs: Value,
    #[serde(default)]
    automatic: Value,
}

/// A node registered in an organization.
///
/// Carries the four attribute sets. The automatic set is collected by the
/// node itself and is read-only on the client side.
#[derive(Debug, Clone)]
pub struct Node {
    org: String,
    name: String,
    environment: String,
    run_list: Vec<String>,
    default: AttributeTree,
    normal: AttributeTree,
    override_attrs: AttributeTree,
    automatic: AttributeTree,
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.name == other.name
    }
}

impl Eq for Node {}

impl Node {
    pub(crate) fn parse(org: &str, body: &str) -> ClientResult<Self> {
        let doc: NodeDoc = json::parse(body)?;
        Ok(Self {
            org: org.to_string(),
            name: doc.name,
            environment: doc.chef_environment,
            run_list: doc.run_list,
            default: AttributeTree::new(Attribute::from_json(&doc.default)),
            normal: AttributeTree::new(Attribute::from_json(&doc.normal)),
            override_attrs: AttributeTree::new(Attribute::from_json(&doc.override_attrs)),
            automatic: AttributeTree::read_only(Attribute::from_json(&doc.automatic)),
        })
    }

    pub fn organization(&self) -> &str {
        &self.org
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn run_list(&self) -> &[String] {
        &self.run_list
    }

    pub fn default_attrs(&self) -> &AttributeTree {
        &self.default
    }

    pub fn normal_attrs(&self) -> &AttributeTree {
        &self.normal
    }

    pub fn normal_attrs_mut(&mut self) -> &mut AttributeTree {
        &mut self.normal
    }

    pub fn override_attrs(&self) -> &AttributeTree {
        &self.override_attrs
    }

    pub fn automatic_attrs(&self) -> &AttributeTree {
        &self.automatic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NODE_BODY: &str = r#"{
        "name": "web-1",
        "chef_environment": "production",
        "run_list": ["recipe[base]", "role[web]"],
        "normal": { "tags": ["frontend"] },
        "default": {},
        "override": {},
        "automatic": { "kernel": { "release": "6.1.0" }, "cpu": { "cores": 4 } }
    }"#;

    #[test]
    fn parses_full_document() {
        let node = Node::parse("acme", NODE_BODY).unwrap();
        assert_eq!(node.name(), "web-1");
        assert_eq!(node.environment(), "production");
        assert_eq!(node.run_list(), ["recipe[base]", "role[web]"]);
        assert_eq!(
            node.automatic_attrs().get(&["cpu", "cores"]),
            Some(&Attribute::Int(4))
        );
    }

    #[test]
    fn environment_defaults_when_absent() {
        let node = Node::parse("acme", r#"{"name": "bare"}"#).unwrap();
        assert_eq!(node.environment(), "_default");
        assert!(node.run_list().is_empty());
    }

    #[test]
    fn missing_name_fails_construction() {
        let err = Node::parse("acme", r#"{"run_list": []}"#).unwrap_err();
        assert!(matches!(err, crate::error::ClientError::Parse { .. }));
    }

    #[test]
    fn automatic_attrs_are_read_only() {
        let node = Node::parse("acme", NODE_BODY).unwrap();
        assert!(node.automatic_attrs().is_read_only());
        assert!(!node.normal_attrs().is_read_only());
    }

    #[test]
    fn normal_attrs_are_writable() {
        let mut node = Node::parse("acme", NODE_BODY).unwrap();
        node.normal_attrs_mut()
            .set(&["tags"], Attribute::string("rebuilt"))
            .unwrap();
        assert_eq!(
            node.normal_attrs().get(&["tags"]),
            Some(&Attribute::String("rebuilt".into()))
        );
    }

    #[test]
    fn equality_is_by_identity() {
        let a = Node::parse("acme", NODE_BODY).unwrap();
        let b = Node::parse("acme", r#"{"name": "web-1"}"#).unwrap();
        let c = Node::parse("acme", r#"{"name": "web-2"}"#).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
