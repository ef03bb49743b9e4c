use super::{CFToCI, CFToSA, CIToCF, PoissonToSA, Transformation, TransformationProperties};

/// Constructor of a transformation instance.
pub type TransformationCtor = fn() -> Box<dyn Transformation>;

/// One edge of the transformation graph.
#[derive(Clone)]
pub struct RegistryEntry {
    pub id: String,
    pub source: String,
    pub target: String,
    pub properties: TransformationProperties,
    pub ctor: TransformationCtor,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("properties", &self.properties)
            .finish()
    }
}

/// The set of transformations available to the planner.
///
/// Assembled explicitly by the caller; there is no global registry.
#[derive(Debug, Clone, Default)]
pub struct TransformationRegistry {
    entries: Vec<RegistryEntry>,
}

impl TransformationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the spike source conversions.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register_neuron_type_transformation(
            || Box::new(CIToCF),
            "SpikeSourceConstInterval",
            "SpikeSourceConstFreq",
        );
        registry.register_neuron_type_transformation(
            || Box::new(CFToCI),
            "SpikeSourceConstFreq",
            "SpikeSourceConstInterval",
        );
        registry.register_neuron_type_transformation(
            || Box::new(PoissonToSA),
            "SpikeSourcePoisson",
            "SpikeSourceArray",
        );
        registry.register_neuron_type_transformation(
            || Box::new(CFToSA),
            "SpikeSourceConstFreq",
            "SpikeSourceArray",
        );
        registry
    }

    /// Register a transformation from neuron type `source` to `target`.
    ///
    /// The constructor is called once to read the identifier and properties.
    pub fn register_neuron_type_transformation(
        &mut self,
        ctor: TransformationCtor,
        source: impl Into<String>,
        target: impl Into<String>,
    ) {
        let instance = ctor();
        self.entries.push(RegistryEntry {
            id: instance.id().to_string(),
            source: source.into(),
            target: target.into(),
            properties: instance.properties(),
            ctor,
        });
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let registry = TransformationRegistry::with_builtin();
        let ids: Vec<&str> = registry.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["CIToCF", "CFToCI", "PoissonToSA", "CFToSA"]);
        assert!(registry
            .entries()
            .iter()
            .all(|e| e.properties == TransformationProperties::default()));
        let sa = &registry.entries()[2];
        assert_eq!((sa.source.as_str(), sa.target.as_str()), ("SpikeSourcePoisson", "SpikeSourceArray"));
        assert_eq!((sa.ctor)().id(), "PoissonToSA");
    }
}
