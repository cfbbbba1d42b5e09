//! Graph serializer.
//!
//! Freezes a [`BuildState`] chain into a [`GraphDefinition`]: an ordered
//! list of encoded vertices, each addressed by the sha256 digest of its
//! encoding and referring to its inputs by digest. The last vertex is the
//! output selector, whose single input is the final filesystem.

use std::collections::{HashMap, HashSet};

use noob_core::error::{NoobError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::state::{BuildState, StateOp};

/// Identifier prefix for registry images.
const IMAGE_SCHEME: &str = "docker-image://";

/// Identifier prefix for host directories bound at submission time.
const LOCAL_SCHEME: &str = "local://";

/// Working directory for exec vertices.
const DEFAULT_CWD: &str = "/";

/// One unit of work in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vertex {
    /// Digests of the vertices this one consumes, in input-slot order
    pub inputs: Vec<String>,
    pub op: VertexOp,
}

/// What a vertex does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VertexOp {
    /// Filesystem source (`docker-image://…` or `local://…`)
    Source { identifier: String },
    /// Run `args` on input 0 with the given environment
    Exec {
        args: Vec<String>,
        env: Vec<String>,
        cwd: String,
    },
    /// Copy `source` from input 1 into `dest` on input 0
    Copy { source: String, dest: String },
    /// Final output: input 0 is the built filesystem
    Output { env: Vec<String> },
}

/// Serialized, engine-consumable build graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDefinition {
    /// Encoded vertices, dependencies before dependents
    pub def: Vec<Vec<u8>>,
}

impl GraphDefinition {
    /// Serialize a build state chain.
    pub fn marshal(state: &BuildState) -> Result<Self> {
        let mut encoder = Encoder::default();
        let mut fs: Option<String> = None;
        let mut locals: HashMap<String, String> = HashMap::new();

        for node in state.chain() {
            match node.op() {
                StateOp::Image { reference } => {
                    if reference.trim().is_empty() {
                        return Err(NoobError::SerializationError(
                            "base image reference is empty".to_string(),
                        ));
                    }
                    let digest = encoder.push(Vertex {
                        inputs: Vec::new(),
                        op: VertexOp::Source {
                            identifier: format!("{}{}", IMAGE_SCHEME, reference),
                        },
                    })?;
                    fs = Some(digest);
                }
                // Metadata only; picked up by later exec and output vertices
                StateOp::Env { .. } => {}
                StateOp::Copy {
                    local,
                    source,
                    dest,
                } => {
                    let base = require_fs(&fs, "copy")?;
                    let local_digest = match locals.get(local) {
                        Some(digest) => digest.clone(),
                        None => {
                            let digest = encoder.push(Vertex {
                                inputs: Vec::new(),
                                op: VertexOp::Source {
                                    identifier: format!("{}{}", LOCAL_SCHEME, local),
                                },
                            })?;
                            locals.insert(local.clone(), digest.clone());
                            digest
                        }
                    };
                    let digest = encoder.push(Vertex {
                        inputs: vec![base, local_digest],
                        op: VertexOp::Copy {
                            source: source.clone(),
                            dest: dest.clone(),
                        },
                    })?;
                    fs = Some(digest);
                }
                StateOp::Exec { args } => {
                    let base = require_fs(&fs, "exec")?;
                    let digest = encoder.push(Vertex {
                        inputs: vec![base],
                        op: VertexOp::Exec {
                            args: args.clone(),
                            env: env_list(node),
                            cwd: DEFAULT_CWD.to_string(),
                        },
                    })?;
                    fs = Some(digest);
                }
            }
        }

        let root = require_fs(&fs, "output")?;
        encoder.push(Vertex {
            inputs: vec![root],
            op: VertexOp::Output {
                env: env_list(state),
            },
        })?;

        let definition = GraphDefinition { def: encoder.def };
        definition.validate()?;
        Ok(definition)
    }

    /// Check that every input refers to an earlier vertex and that the
    /// definition ends in an output vertex.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::new();
        let vertices = self.vertices()?;

        for (idx, (digest, vertex)) in vertices.iter().enumerate() {
            for input in &vertex.inputs {
                if !seen.contains(input) {
                    return Err(NoobError::SerializationError(format!(
                        "vertex {} ({}) references unknown input {}",
                        idx, digest, input
                    )));
                }
            }
            seen.insert(digest.clone());
        }

        match vertices.last() {
            Some((_, Vertex { op: VertexOp::Output { .. }, inputs })) if inputs.len() == 1 => Ok(()),
            Some(_) => Err(NoobError::SerializationError(
                "definition does not end in an output vertex".to_string(),
            )),
            None => Err(NoobError::SerializationError(
                "definition is empty".to_string(),
            )),
        }
    }

    /// Decode every vertex, paired with its digest.
    pub fn vertices(&self) -> Result<Vec<(String, Vertex)>> {
        self.def
            .iter()
            .map(|bytes| {
                let vertex: Vertex = serde_json::from_slice(bytes)?;
                Ok((digest_of(bytes), vertex))
            })
            .collect()
    }

    /// Digests of all vertices, in definition order.
    pub fn digests(&self) -> Vec<String> {
        self.def.iter().map(|bytes| digest_of(bytes)).collect()
    }

    pub fn vertex_count(&self) -> usize {
        self.def.len()
    }

    /// Human-readable JSON rendering: `[{"digest": …, "vertex": …}, …]`.
    pub fn to_json_pretty(&self) -> Result<String> {
        let entries: Vec<serde_json::Value> = self
            .vertices()?
            .into_iter()
            .map(|(digest, vertex)| serde_json::json!({ "digest": digest, "vertex": vertex }))
            .collect();
        Ok(serde_json::to_string_pretty(&entries)?)
    }
}

#[derive(Default)]
struct Encoder {
    def: Vec<Vec<u8>>,
    emitted: HashSet<String>,
}

impl Encoder {
    /// Encode `vertex` and append it unless an identical vertex exists.
    fn push(&mut self, vertex: Vertex) -> Result<String> {
        let bytes = serde_json::to_vec(&vertex)?;
        let digest = digest_of(&bytes);
        if self.emitted.insert(digest.clone()) {
            self.def.push(bytes);
        }
        Ok(digest)
    }
}

fn require_fs(fs: &Option<String>, what: &str) -> Result<String> {
    fs.clone().ok_or_else(|| {
        NoobError::SerializationError(format!("{} vertex has no base filesystem", what))
    })
}

fn env_list(state: &BuildState) -> Vec<String> {
    state
        .env()
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect()
}

fn digest_of(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
