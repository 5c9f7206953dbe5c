use crate::error::{self, Result};
use crate::plan::{Plan, PlannedResource};
use crate::resource::{Describe, ResourceDescription, Urn};
use crate::state::State;
use log::{debug, trace};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use topological_sort::TopologicalSort;

/// The resource graph of one deployment. Resources are described through a [`Scope`] so that a
/// component either describes all of its resources or none of them.
#[derive(Debug)]
pub struct Stack {
    name: String,
    resources: Vec<ResourceDescription>,
    index: HashMap<Urn, usize>,
    default_parent: Option<Urn>,
}

impl Stack {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            index: HashMap::new(),
            default_parent: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components committed from now on are nested under `parent` unless they name their own.
    pub fn set_default_parent(&mut self, parent: Option<Urn>) {
        self.default_parent = parent;
    }

    /// Move every resource of `other` into this stack. Nothing is moved if any of them has
    /// already been described here.
    pub fn merge(&mut self, other: Stack) -> Result<()> {
        for resource in &other.resources {
            self.ensure_unique(resource.urn())?;
        }
        debug!(
            "Merging {} resources from '{}' into '{}'",
            other.resources.len(),
            other.name,
            self.name
        );
        for resource in other.resources {
            self.register(resource)?;
        }
        Ok(())
    }

    /// Describe a single resource outside of any component.
    pub fn register(&mut self, description: ResourceDescription) -> Result<Urn> {
        let urn = description.urn().clone();
        self.ensure_unique(&urn)?;
        trace!("Registering '{}'", urn);
        self.index.insert(urn.clone(), self.resources.len());
        self.resources.push(description);
        Ok(urn)
    }

    /// Open a scope for `component`. Nothing is added to the stack until [`Scope::commit`] is
    /// called.
    pub fn scope(&mut self, mut component: ResourceDescription) -> Result<Scope<'_>> {
        self.ensure_unique(component.urn())?;
        if let Some(parent) = &self.default_parent {
            component.set_parent_if_none(parent);
        }
        Ok(Scope {
            component: component.urn().clone(),
            pending: vec![component],
            stack: self,
        })
    }

    pub fn get(&self, urn: &Urn) -> Option<&ResourceDescription> {
        self.index
            .get(urn)
            .and_then(|position| self.resources.get(*position))
    }

    pub fn contains(&self, urn: &Urn) -> bool {
        self.index.contains_key(urn)
    }

    /// All described resources in the order they were described.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceDescription> {
        self.resources.iter()
    }

    /// The resources whose parent is `component`.
    pub fn children<'a>(&'a self, component: &'a Urn) -> impl Iterator<Item = &'a ResourceDescription> {
        self.resources
            .iter()
            .filter(move |resource| resource.parent() == Some(component))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Group the resources into layers such that every resource comes after its parent and
    /// everything it depends on. Resources within a layer are independent of each other.
    pub fn creation_order(&self) -> Result<Vec<Vec<Urn>>> {
        let mut topo_sort = TopologicalSort::<Urn>::new();
        for resource in &self.resources {
            let urn = resource.urn();
            topo_sort.insert(urn.clone());
            for dependency in self.ordering_dependencies(resource)? {
                topo_sort.add_dependency(dependency, urn.clone());
            }
        }

        let mut layers = Vec::new();
        while !topo_sort.is_empty() {
            let mut layer = topo_sort.pop_all();
            if layer.is_empty() {
                return Err(error::CycleSnafu {
                    remaining: topo_sort.len(),
                }
                .build()
                .into());
            }
            layer.sort();
            layers.push(layer);
        }
        debug!(
            "Ordered {} resources of stack '{}' into {} layers",
            self.resources.len(),
            self.name,
            layers.len()
        );
        Ok(layers)
    }

    /// Resolve the concrete inputs of `urn` from the state of the resources it depends on.
    pub fn resolve_inputs(&self, urn: &Urn, state: &State) -> Result<Map<String, Value>> {
        let resource = self.get(urn).ok_or_else(|| {
            error::Error::from(
                error::UnknownResourceSnafu {
                    urn: urn.to_string(),
                }
                .build(),
            )
        })?;
        resource
            .inputs()
            .iter()
            .map(|(key, input)| Ok((key.clone(), input.resolve(state)?)))
            .collect()
    }

    /// Produce the plan document for this stack.
    pub fn plan(&self) -> Result<Plan> {
        let mut resources = Vec::with_capacity(self.resources.len());
        for (layer, urns) in self.creation_order()?.into_iter().enumerate() {
            for urn in urns {
                let description = self.get(&urn).ok_or_else(|| {
                    error::Error::from(
                        error::UnknownResourceSnafu {
                            urn: urn.to_string(),
                        }
                        .build(),
                    )
                })?;
                let inputs: BTreeMap<String, Value> = description
                    .inputs()
                    .iter()
                    .map(|(key, input)| (key.clone(), input.render()))
                    .collect();
                resources.push(PlannedResource {
                    kind: urn.kind().to_string(),
                    name: urn.name().to_string(),
                    layer,
                    parent: description.parent().cloned(),
                    depends_on: description.dependencies().into_iter().collect(),
                    inputs,
                    urn,
                });
            }
        }
        Ok(Plan {
            stack: self.name.clone(),
            resources,
        })
    }

    fn ensure_unique(&self, urn: &Urn) -> Result<()> {
        if self.contains(urn) {
            return Err(error::DuplicateResourceSnafu {
                urn: urn.to_string(),
            }
            .build()
            .into());
        }
        Ok(())
    }

    fn ordering_dependencies(&self, resource: &ResourceDescription) -> Result<BTreeSet<Urn>> {
        let mut dependencies = resource.dependencies();
        if let Some(parent) = resource.parent() {
            dependencies.insert(parent.clone());
        }
        for dependency in &dependencies {
            if !self.contains(dependency) {
                return Err(error::UnknownDependencySnafu {
                    resource: resource.urn().to_string(),
                    dependency: dependency.to_string(),
                }
                .build()
                .into());
            }
        }
        Ok(dependencies)
    }
}

/// Collects the resources of one component. Dropping a scope without committing it leaves the
/// stack unchanged.
#[derive(Debug)]
pub struct Scope<'a> {
    stack: &'a mut Stack,
    component: Urn,
    pending: Vec<ResourceDescription>,
}

impl<'a> Scope<'a> {
    /// The component that resources described in this scope belong to.
    pub fn component(&self) -> &Urn {
        &self.component
    }

    /// Describe a resource as a child of this scope's component, unless it already names a parent.
    pub fn describe(&mut self, mut description: ResourceDescription) -> Result<Urn> {
        let urn = description.urn().clone();
        if self.stack.contains(&urn) || self.pending.iter().any(|pending| pending.urn() == &urn) {
            return Err(error::DuplicateResourceSnafu {
                urn: urn.to_string(),
            }
            .build()
            .into());
        }
        description.set_parent_if_none(&self.component);
        trace!("Describing '{}' in '{}'", urn, self.component);
        self.pending.push(description);
        Ok(urn)
    }

    /// The number of resources described so far, including the component.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Add everything described in this scope to the stack.
    pub fn commit(self) -> Result<Urn> {
        debug!(
            "Committing {} resources for '{}'",
            self.pending.len(),
            self.component
        );
        for description in self.pending {
            self.stack.register(description)?;
        }
        Ok(self.component)
    }
}
