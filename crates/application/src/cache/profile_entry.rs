use std::collections::{HashMap, HashSet};

use domain::{DeviceObject, DeviceProfile, Method, ResourceOperation};

/// A profile together with the lookup tables derived from it.
///
/// Derived tables are only ever built from scratch in [`ProfileEntry::build`],
/// so they can never drift from `profile`.
#[derive(Debug, Clone)]
pub(crate) struct ProfileEntry {
    pub profile: DeviceProfile,
    pub objects: HashMap<String, DeviceObject>,
    pub operations: HashMap<(String, Method), Vec<ResourceOperation>>,
    pub commands: HashSet<String>,
    /// The `get` operation that reads each object, used for pushed values.
    /// A resource named after its object wins over composite resources.
    pub reads: HashMap<String, ResourceOperation>,
}

impl ProfileEntry {
    pub fn build(profile: DeviceProfile) -> Self {
        let objects = profile
            .device_objects
            .iter()
            .map(|o| (o.name.clone(), o.clone()))
            .collect();

        let commands = profile.commands.iter().map(|c| c.name.clone()).collect();

        let mut operations = HashMap::new();
        for resource in &profile.resources {
            if !resource.get.is_empty() {
                operations.insert((resource.name.clone(), Method::Get), resource.get.clone());
            }
            if !resource.set.is_empty() {
                operations.insert((resource.name.clone(), Method::Set), resource.set.clone());
            }
        }

        let mut reads: HashMap<String, ResourceOperation> = HashMap::new();
        let (own, composite): (Vec<_>, Vec<_>) = profile
            .resources
            .iter()
            .flat_map(|r| r.get.iter().map(move |op| (r.name.as_str(), op)))
            .partition(|(name, op)| *name == op.object);
        for (_, op) in own.into_iter().chain(composite) {
            reads.entry(op.object.clone()).or_insert_with(|| op.clone());
        }

        Self {
            profile,
            objects,
            operations,
            commands,
            reads,
        }
    }
}
