use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use crate::{
    messages::delivery::Channel,
    schema::{
        behaviour::{BehaviourSchema, BehaviourState},
        error::SchemaError,
        value::ValueKind,
    },
};

/// Index of a behaviour schema within a `Protocol`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BehaviourKind(u16);

impl BehaviourKind {
    pub const TRANSFORM: BehaviourKind = BehaviourKind(0);

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// The ordered behaviour list every entity spawned from an asset carries.
/// Behaviour 0 is always the transform.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prototype {
    name: String,
    behaviours: Vec<BehaviourKind>,
}

impl Prototype {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behaviours(&self) -> &[BehaviourKind] {
        &self.behaviours
    }
}

/// Where an action runs and which arguments it takes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionSignature {
    pub action_id: u32,
    pub behaviour: BehaviourKind,
    pub params: Vec<ValueKind>,
}

/// Shared schema table: behaviour field layouts, asset prototypes and
/// action signatures. Server and client must build identical protocols;
/// `fingerprint()` is exchanged during the handshake to check that.
#[derive(Clone, Debug)]
pub struct Protocol {
    behaviours: Vec<Arc<BehaviourSchema>>,
    prototypes: HashMap<String, Prototype>,
    actions: BTreeMap<u32, ActionSignature>,
    locked: bool,
}

impl Default for Protocol {
    fn default() -> Self {
        Self {
            behaviours: vec![Arc::new(BehaviourSchema::transform())],
            prototypes: HashMap::new(),
            actions: BTreeMap::new(),
            locked: false,
        }
    }
}

impl Protocol {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn add_behaviour(&mut self, schema: BehaviourSchema) -> Result<&mut Self, SchemaError> {
        self.check_lock()?;
        schema.validate()?;
        if self.behaviour_kind(schema.name()).is_some() {
            return Err(SchemaError::DuplicateBehaviour {
                name: schema.name().to_string(),
            });
        }
        self.behaviours.push(Arc::new(schema));
        Ok(self)
    }

    /// Declares the behaviours of the asset called `name`, after the implicit transform
    pub fn add_prototype(
        &mut self,
        name: &str,
        behaviours: &[&str],
    ) -> Result<&mut Self, SchemaError> {
        self.check_lock()?;
        if name.is_empty() {
            return Err(SchemaError::EmptyName);
        }
        if self.prototypes.contains_key(name) {
            return Err(SchemaError::DuplicatePrototype {
                name: name.to_string(),
            });
        }
        let mut kinds = vec![BehaviourKind::TRANSFORM];
        for behaviour in behaviours {
            let kind = self.resolve(behaviour)?;
            if kinds.contains(&kind) {
                return Err(SchemaError::DuplicateBehaviour {
                    name: behaviour.to_string(),
                });
            }
            kinds.push(kind);
        }
        self.prototypes.insert(
            name.to_string(),
            Prototype {
                name: name.to_string(),
                behaviours: kinds,
            },
        );
        Ok(self)
    }

    pub fn add_action(
        &mut self,
        action_id: u32,
        behaviour: &str,
        params: &[ValueKind],
    ) -> Result<&mut Self, SchemaError> {
        self.check_lock()?;
        if self.actions.contains_key(&action_id) {
            return Err(SchemaError::DuplicateAction { action_id });
        }
        let behaviour = self.resolve(behaviour)?;
        self.actions.insert(
            action_id,
            ActionSignature {
                action_id,
                behaviour,
                params: params.to_vec(),
            },
        );
        Ok(self)
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn check_lock(&self) -> Result<(), SchemaError> {
        if self.locked {
            Err(SchemaError::AlreadyLocked)
        } else {
            Ok(())
        }
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn behaviour_kind(&self, name: &str) -> Option<BehaviourKind> {
        self.behaviours
            .iter()
            .position(|schema| schema.name() == name)
            .map(|index| BehaviourKind(index as u16))
    }

    pub fn behaviour(&self, kind: BehaviourKind) -> Option<&Arc<BehaviourSchema>> {
        self.behaviours.get(kind.index())
    }

    pub fn prototype(&self, name: &str) -> Option<&Prototype> {
        self.prototypes.get(name)
    }

    pub fn action(&self, action_id: u32) -> Option<&ActionSignature> {
        self.actions.get(&action_id)
    }

    /// Fresh behaviour states for an entity of this prototype
    pub fn instantiate(&self, prototype: &Prototype) -> Vec<BehaviourState> {
        prototype
            .behaviours
            .iter()
            .filter_map(|kind| self.behaviour(*kind))
            .map(|schema| BehaviourState::new(schema.clone()))
            .collect()
    }

    /// FNV-1a over every name, kind and channel that shapes the wire format
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Fnv1a::new();
        for schema in &self.behaviours {
            hasher.write_str(schema.name());
            for field in schema.fields() {
                hasher.write_str(&field.name);
                hasher.write(&[
                    match field.channel {
                        Channel::Reliable => 1,
                        Channel::Unreliable => 2,
                    },
                    field.kind().tag(),
                ]);
            }
        }

        let mut prototypes: Vec<&Prototype> = self.prototypes.values().collect();
        prototypes.sort_by(|a, b| a.name.cmp(&b.name));
        for prototype in prototypes {
            hasher.write_str(&prototype.name);
            for kind in &prototype.behaviours {
                hasher.write(&kind.0.to_le_bytes());
            }
        }

        for signature in self.actions.values() {
            hasher.write(&signature.action_id.to_le_bytes());
            hasher.write(&signature.behaviour.0.to_le_bytes());
            for param in &signature.params {
                hasher.write(&[param.tag()]);
            }
        }
        hasher.finish()
    }

    fn resolve(&self, behaviour: &str) -> Result<BehaviourKind, SchemaError> {
        self.behaviour_kind(behaviour)
            .ok_or_else(|| SchemaError::UnknownBehaviour {
                name: behaviour.to_string(),
            })
    }
}

struct Fnv1a(u64);

impl Fnv1a {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    fn new() -> Self {
        Self(Self::OFFSET_BASIS)
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.0 ^= u64::from(*byte);
            self.0 = self.0.wrapping_mul(Self::PRIME);
        }
    }

    // names are terminated so ("ab", "c") and ("a", "bc") differ
    fn write_str(&mut self, value: &str) {
        self.write(value.as_bytes());
        self.write(&[0xFF]);
    }

    fn finish(&self) -> u64 {
        self.0
    }
}
