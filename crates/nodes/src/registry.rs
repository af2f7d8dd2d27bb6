//! Node-kind registry.
//!
//! Maps a kind key to a [`KindDescriptor`] capability record. The six
//! built-in kinds are always present; hosts register extra kinds under
//! free-form string keys before first use. The process-wide registry is
//! installed exactly once and read-only thereafter.

use std::collections::HashMap;
use std::sync::OnceLock;

use graph::NodeKind;
use serde::Serialize;
use tracing::info;

// ---------------------------------------------------------------------------
// KindDescriptor
// ---------------------------------------------------------------------------

/// Capability record for a node kind: how the factories should shape a new
/// node of this kind, and how a palette should present it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KindDescriptor {
    pub display_name: String,
    /// Number of untyped input ports a factory-built node starts with.
    pub default_inputs: usize,
    /// Number of untyped output ports a factory-built node starts with.
    pub default_outputs: usize,
    /// Whether this kind is meant to carry typed ports.
    pub typed_ports: bool,
    /// Simulated duration stamped onto factory-built nodes, when declared.
    pub default_duration_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// KindRegistry
// ---------------------------------------------------------------------------

static GLOBAL: OnceLock<KindRegistry> = OnceLock::new();

/// The kind-key → descriptor table.
#[derive(Debug, Clone)]
pub struct KindRegistry {
    entries: HashMap<String, KindDescriptor>,
}

impl KindRegistry {
    /// A registry holding only the six built-in kinds.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            entries: HashMap::new(),
        };

        registry.register(
            "input",
            KindDescriptor {
                display_name: "Input node".into(),
                default_inputs: 0,
                default_outputs: 1,
                typed_ports: false,
                default_duration_ms: None,
            },
        );
        registry.register(
            "process",
            KindDescriptor {
                display_name: "Process node".into(),
                default_inputs: 1,
                default_outputs: 1,
                typed_ports: false,
                default_duration_ms: Some(2500),
            },
        );
        registry.register(
            "transform",
            KindDescriptor {
                display_name: "Transform node".into(),
                default_inputs: 1,
                default_outputs: 1,
                typed_ports: false,
                default_duration_ms: Some(3000),
            },
        );
        registry.register(
            "filter",
            KindDescriptor {
                display_name: "Filter node".into(),
                default_inputs: 1,
                default_outputs: 1,
                typed_ports: false,
                default_duration_ms: Some(2000),
            },
        );
        registry.register(
            "custom",
            KindDescriptor {
                display_name: "Custom node".into(),
                default_inputs: 1,
                default_outputs: 1,
                typed_ports: false,
                default_duration_ms: Some(2800),
            },
        );
        registry.register(
            "output",
            KindDescriptor {
                display_name: "Output node".into(),
                default_inputs: 1,
                default_outputs: 0,
                typed_ports: false,
                default_duration_ms: None,
            },
        );

        registry
    }

    /// Register (or replace) the descriptor for a kind key.
    pub fn register(&mut self, key: impl Into<String>, descriptor: KindDescriptor) {
        self.entries.insert(key.into(), descriptor);
    }

    pub fn descriptor(&self, kind: &NodeKind) -> Option<&KindDescriptor> {
        self.entries.get(kind.key())
    }

    pub fn descriptor_for_key(&self, key: &str) -> Option<&KindDescriptor> {
        self.entries.get(key)
    }

    /// All registered kinds sorted by key — the palette a sidebar renders.
    pub fn palette(&self) -> Vec<(&str, &KindDescriptor)> {
        let mut entries: Vec<(&str, &KindDescriptor)> = self
            .entries
            .iter()
            .map(|(key, descriptor)| (key.as_str(), descriptor))
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    /// Install this registry as the process-wide table.
    ///
    /// Must happen before the first call to [`KindRegistry::global`]; the
    /// registry is read-only afterwards. Returns the rejected registry if
    /// one is already installed.
    pub fn install(self) -> Result<(), KindRegistry> {
        GLOBAL.set(self)?;
        info!("node kind registry installed");
        Ok(())
    }

    /// The process-wide registry; falls back to the built-ins-only table if
    /// the host never installed one.
    pub fn global() -> &'static KindRegistry {
        GLOBAL.get_or_init(KindRegistry::with_builtins)
    }
}

impl Default for KindRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
