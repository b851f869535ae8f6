use std::collections::{HashMap, HashSet};

use crate::model::BlankNode;

/// Issues blank node labels for one parse session.
///
/// Generated labels are `b1`, `b2`, ... and never reuse a label already read
/// from the input. An input label that matches a label generated earlier is
/// relabelled, consistently, to a fresh one.
#[derive(Clone, Debug)]
pub struct BlankNodeIssuer {
    prefix: String,
    counter: u64,
    from_input: HashSet<String>,
    generated: HashSet<String>,
    relabelled: HashMap<String, String>,
}

impl Default for BlankNodeIssuer {
    fn default() -> Self {
        Self::new("b")
    }
}

impl BlankNodeIssuer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            from_input: HashSet::new(),
            generated: HashSet::new(),
            relabelled: HashMap::new(),
        }
    }

    /// Issue a new anonymous blank node.
    pub fn fresh(&mut self) -> BlankNode {
        loop {
            self.counter += 1;
            let id = format!("{}{}", self.prefix, self.counter);
            if !self.from_input.contains(&id) {
                self.generated.insert(id.clone());
                return BlankNode::new(id);
            }
        }
    }

    /// The blank node for a label read from the input.
    pub fn labelled(&mut self, label: &str) -> BlankNode {
        if let Some(id) = self.relabelled.get(label) {
            return BlankNode::new(id.clone());
        }
        if self.generated.contains(label) {
            let fresh = self.fresh();
            self.relabelled.insert(label.to_string(), fresh.id.clone());
            return fresh;
        }
        if !self.from_input.contains(label) {
            self.from_input.insert(label.to_string());
        }
        BlankNode::new(label)
    }

    /// Number of labels generated so far.
    pub fn issued(&self) -> u64 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_issuance() {
        let mut issuer = BlankNodeIssuer::default();
        assert_eq!(issuer.fresh().id, "b1");
        assert_eq!(issuer.fresh().id, "b2");
        assert_eq!(issuer.issued(), 2);
    }

    #[test]
    fn input_labels_are_preserved() {
        let mut issuer = BlankNodeIssuer::default();
        assert_eq!(issuer.labelled("alice").id, "alice");
        assert_eq!(issuer.labelled("alice").id, "alice");
    }

    #[test]
    fn fresh_skips_input_labels() {
        let mut issuer = BlankNodeIssuer::default();
        issuer.labelled("b1");
        assert_eq!(issuer.fresh().id, "b2");
    }

    #[test]
    fn late_collision_is_relabelled_consistently() {
        let mut issuer = BlankNodeIssuer::default();
        let generated = issuer.fresh();
        assert_eq!(generated.id, "b1");
        let first = issuer.labelled("b1");
        assert_ne!(first, generated);
        assert_eq!(issuer.labelled("b1"), first);
    }

    #[test]
    fn clone_independent() {
        let mut issuer = BlankNodeIssuer::default();
        issuer.fresh();
        let mut cloned = issuer.clone();
        cloned.fresh();
        assert_eq!(issuer.issued(), 1);
        assert_eq!(cloned.issued(), 2);
    }
}
