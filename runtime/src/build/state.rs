//! Immutable build state chain.
//!
//! A [`BuildState`] is the filesystem plus metadata produced by applying an
//! ordered prefix of operations to a base image. Applying an operation never
//! mutates a state; it returns a new one holding a shared reference to its
//! predecessor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use noob_core::error::Result;

/// A host directory exposed to the engine under a logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    name: String,
    path: PathBuf,
}

impl LocalSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Bind the current working directory to `name`.
    pub fn from_current_dir(name: impl Into<String>) -> Result<Self> {
        let pwd = std::env::current_dir()?;
        Ok(Self::new(name, pwd))
    }

    /// Logical name referenced by copy operations.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host directory the name resolves to.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The step that produced a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateOp {
    /// Base image; the root of every chain
    Image { reference: String },
    /// Environment binding (metadata only, filesystem unchanged)
    Env { key: String, value: String },
    /// Copy from a named local source into the build filesystem
    Copy {
        local: String,
        source: String,
        dest: String,
    },
    /// Run a command; its root filesystem becomes the new state
    Exec { args: Vec<String> },
}

#[derive(Debug, PartialEq, Eq)]
struct StateNode {
    op: StateOp,
    parent: Option<BuildState>,
    env: Arc<BTreeMap<String, String>>,
    depth: usize,
}

/// One link in the build state chain.
///
/// Cloning is cheap. Equality is structural: two states are equal when they
/// were built from the same base image by the same operations in the same
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildState {
    node: Arc<StateNode>,
}

impl BuildState {
    /// Start a chain from a base image reference.
    pub fn image(reference: impl Into<String>) -> Self {
        Self {
            node: Arc::new(StateNode {
                op: StateOp::Image {
                    reference: reference.into(),
                },
                parent: None,
                env: Arc::new(BTreeMap::new()),
                depth: 0,
            }),
        }
    }

    fn derive(&self, op: StateOp, env: Arc<BTreeMap<String, String>>) -> Self {
        Self {
            node: Arc::new(StateNode {
                op,
                parent: Some(self.clone()),
                env,
                depth: self.node.depth + 1,
            }),
        }
    }

    /// Bind `key` to `value`. Later bindings of the same key win.
    pub fn add_env(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        let mut env = (*self.node.env).clone();
        env.insert(key.clone(), value.clone());
        self.derive(StateOp::Env { key, value }, Arc::new(env))
    }

    /// Copy `source` from `local` to `dest` inside the build filesystem.
    pub fn copy(
        &self,
        local: &LocalSource,
        source: impl Into<String>,
        dest: impl Into<String>,
    ) -> Self {
        self.derive(
            StateOp::Copy {
                local: local.name().to_string(),
                source: source.into(),
                dest: dest.into(),
            },
            self.node.env.clone(),
        )
    }

    /// Run `args` against this state's filesystem and environment.
    pub fn run(&self, args: Vec<String>) -> Self {
        self.derive(StateOp::Exec { args }, self.node.env.clone())
    }

    /// The step that produced this state.
    pub fn op(&self) -> &StateOp {
        &self.node.op
    }

    /// The state this one was derived from, `None` for the base image.
    pub fn parent(&self) -> Option<&BuildState> {
        self.node.parent.as_ref()
    }

    /// Environment in effect at this state.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.node.env
    }

    pub fn get_env(&self, key: &str) -> Option<&str> {
        self.node.env.get(key).map(String::as_str)
    }

    /// Number of operations applied on top of the base image.
    pub fn depth(&self) -> usize {
        self.node.depth
    }

    /// Base image reference at the root of the chain.
    pub fn base_image(&self) -> &str {
        let mut current = self;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        match current.op() {
            StateOp::Image { reference } => reference,
            _ => "",
        }
    }

    /// All states from the base image up to and including this one.
    pub fn chain(&self) -> Vec<&BuildState> {
        let mut states = Vec::with_capacity(self.depth() + 1);
        let mut current = Some(self);
        while let Some(state) = current {
            states.push(state);
            current = state.parent();
        }
        states.reverse();
        states
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> LocalSource {
        LocalSource::new("local-pwd", "/work")
    }

    #[test]
    fn test_image_is_root() {
        let state = BuildState::image("alpine");
        assert_eq!(state.depth(), 0);
        assert!(state.parent().is_none());
        assert_eq!(state.base_image(), "alpine");
        assert!(state.env().is_empty());
    }

    #[test]
    fn test_derive_does_not_mutate_predecessor() {
        let base = BuildState::image("alpine");
        let next = base.add_env("FOO", "bar");

        assert!(base.env().is_empty());
        assert_eq!(next.get_env("FOO"), Some("bar"));
        assert_eq!(next.parent(), Some(&base));
        assert_eq!(next.depth(), 1);
    }

    #[test]
    fn test_env_last_write_wins() {
        let state = BuildState::image("alpine")
            .add_env("FOO", "one")
            .add_env("BAR", "x")
            .add_env("FOO", "two");
        assert_eq!(state.get_env("FOO"), Some("two"));
        assert_eq!(state.get_env("BAR"), Some("x"));
        assert_eq!(state.depth(), 3);
    }

    #[test]
    fn test_env_carries_through_run_and_copy() {
        let state = BuildState::image("alpine")
            .add_env("FOO", "bar")
            .run(vec!["echo".into(), "hi".into()])
            .copy(&local(), "a", "/b");
        assert_eq!(state.get_env("FOO"), Some("bar"));
    }

    #[test]
    fn test_copy_records_local_name() {
        let state = BuildState::image("alpine").copy(&local(), "src.txt", "/dst.txt");
        assert_eq!(
            state.op(),
            &StateOp::Copy {
                local: "local-pwd".to_string(),
                source: "src.txt".to_string(),
                dest: "/dst.txt".to_string(),
            }
        );
    }

    #[test]
    fn test_chain_is_root_first() {
        let state = BuildState::image("alpine")
            .add_env("A", "1")
            .run(vec!["true".into()]);
        let ops: Vec<&StateOp> = state.chain().into_iter().map(BuildState::op).collect();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], StateOp::Image { .. }));
        assert!(matches!(ops[1], StateOp::Env { .. }));
        assert!(matches!(ops[2], StateOp::Exec { .. }));
    }

    #[test]
    fn test_equal_chains_compare_equal() {
        let build = || {
            BuildState::image("alpine")
                .add_env("A", "1")
                .run(vec!["make".into()])
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_order_matters() {
        let a = BuildState::image("alpine").add_env("A", "1").add_env("B", "2");
        let b = BuildState::image("alpine").add_env("B", "2").add_env("A", "1");
        assert_eq!(a.env(), b.env());
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_base_images_differ() {
        let a = BuildState::image("alpine").run(vec!["ls".into()]);
        let b = BuildState::image("debian").run(vec!["ls".into()]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_local_source_from_current_dir() {
        let local = LocalSource::from_current_dir("ctx").unwrap();
        assert_eq!(local.name(), "ctx");
        assert!(local.path().is_absolute());
    }
}
