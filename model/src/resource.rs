use crate::configuration::Configuration;
use crate::constants::URN_SEPARATOR;
use crate::error::{self, Error, Result};
use crate::output::{Output, Reference};
use crate::state::State;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use serde_plain::{derive_deserialize_from_fromstr, derive_serialize_from_display};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The identity of a described resource, made of its kind (e.g. `aws:ec2:Vpc`) and its logical
/// name. A URN is unique within a [`Stack`](crate::Stack).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Urn {
    kind: String,
    name: String,
}

impl Urn {
    pub fn new<K, N>(kind: K, name: N) -> Self
    where
        K: Into<String>,
        N: Into<String>,
    {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A deferred handle to one of this resource's output attributes.
    pub fn output<T>(&self, attribute: &str) -> Output<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        Output::reference(Reference::new(self.clone(), attribute))
    }
}

impl Display for Urn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.kind, URN_SEPARATOR, self.name)
    }
}

impl FromStr for Urn {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(URN_SEPARATOR) {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() => Ok(Self::new(kind, name)),
            _ => Err(error::UrnParseSnafu { value: s }.build().into()),
        }
    }
}

derive_serialize_from_display!(Urn);
derive_deserialize_from_fromstr!(Urn, "a resource URN such as 'aws:ec2:Vpc::dev'");

/// A single input parameter of a resource. Inputs are either concrete values that are known while
/// the graph is being described, deferred values that only an engine can resolve, or lists and
/// objects that mix the two.
#[derive(Clone, Debug)]
pub enum Input {
    Value(Value),
    Deferred(Output<Value>),
    List(Vec<Input>),
    Object(BTreeMap<String, Input>),
}

impl Input {
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        Input::List(items.into_iter().map(Into::into).collect())
    }

    pub fn object<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<Input>,
    {
        Input::Object(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// The resources whose outputs this input is derived from.
    pub fn dependencies(&self) -> BTreeSet<Urn> {
        match self {
            Input::Value(_) => BTreeSet::new(),
            Input::Deferred(output) => output
                .sources()
                .iter()
                .map(|reference| reference.urn().clone())
                .collect(),
            Input::List(items) => items.iter().flat_map(Input::dependencies).collect(),
            Input::Object(entries) => entries.values().flat_map(Input::dependencies).collect(),
        }
    }

    /// The concrete value of this input once everything it is derived from is in `state`.
    pub fn resolve(&self, state: &State) -> Result<Value> {
        Ok(match self {
            Input::Value(value) => value.clone(),
            Input::Deferred(output) => output.resolve(state)?,
            Input::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| item.resolve(state))
                    .collect::<Result<_>>()?,
            ),
            Input::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| Ok((key.clone(), value.resolve(state)?)))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Render the input for a plan document. Deferred values are rendered as templated strings.
    pub fn render(&self) -> Value {
        match self {
            Input::Value(value) => value.clone(),
            Input::Deferred(output) => output.render(),
            Input::List(items) => Value::Array(items.iter().map(Input::render).collect()),
            Input::Object(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.render()))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Value(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Value(Value::String(value.to_string()))
    }
}

impl From<&String> for Input {
    fn from(value: &String) -> Self {
        Input::Value(Value::String(value.clone()))
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Value(Value::String(value))
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Value(Value::Bool(value))
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Input::Value(Value::from(value))
    }
}

impl From<u16> for Input {
    fn from(value: u16) -> Self {
        Input::Value(Value::from(value))
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Input::Value(Value::from(value))
    }
}

impl<T> From<Output<T>> for Input
where
    T: Serialize + Send + Sync + 'static,
{
    fn from(output: Output<T>) -> Self {
        Input::Deferred(output.into_value())
    }
}

impl<T> From<&Output<T>> for Input
where
    T: Serialize + Send + Sync + 'static,
{
    fn from(output: &Output<T>) -> Self {
        Input::Deferred(output.clone().into_value())
    }
}

/// The description of one resource that an engine should create: its kind and name, its inputs,
/// the component it belongs to, and any resources that must exist before it even though none of
/// their outputs are consumed.
#[derive(Clone, Debug)]
pub struct ResourceDescription {
    urn: Urn,
    inputs: BTreeMap<String, Input>,
    parent: Option<Urn>,
    depends_on: BTreeSet<Urn>,
}

impl ResourceDescription {
    pub fn new<K, N>(kind: K, name: N) -> Self
    where
        K: Into<String>,
        N: Into<String>,
    {
        Self {
            urn: Urn::new(kind, name),
            inputs: BTreeMap::new(),
            parent: None,
            depends_on: BTreeSet::new(),
        }
    }

    pub fn input<S, I>(mut self, key: S, value: I) -> Self
    where
        S: Into<String>,
        I: Into<Input>,
    {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Add an input only when `value` is present.
    pub fn optional_input<S, I>(self, key: S, value: Option<I>) -> Self
    where
        S: Into<String>,
        I: Into<Input>,
    {
        match value {
            Some(value) => self.input(key, value),
            None => self,
        }
    }

    /// Add every field of `config` as an input.
    pub fn configuration<C: Configuration>(mut self, config: &C) -> Result<Self> {
        for (key, value) in config.clone().into_map()? {
            self.inputs.insert(key, Input::Value(value));
        }
        Ok(self)
    }

    pub fn parent(mut self, parent: &Urn) -> Self {
        self.parent = Some(parent.clone());
        self
    }

    pub fn depends_on(mut self, urn: &Urn) -> Self {
        self.depends_on.insert(urn.clone());
        self
    }

    pub fn depends_on_all<'a, I>(mut self, urns: I) -> Self
    where
        I: IntoIterator<Item = &'a Urn>,
    {
        self.depends_on.extend(urns.into_iter().cloned());
        self
    }

    pub fn inputs(&self) -> &BTreeMap<String, Input> {
        &self.inputs
    }

    pub fn explicit_dependencies(&self) -> &BTreeSet<Urn> {
        &self.depends_on
    }

    pub(crate) fn set_parent_if_none(&mut self, parent: &Urn) {
        if self.parent.is_none() && &self.urn != parent {
            self.parent = Some(parent.clone());
        }
    }
}

/// Anything that has been described to the engine: a single resource or a component that groups
/// several of them.
pub trait Describe {
    fn urn(&self) -> &Urn;

    /// The component this resource belongs to, if any.
    fn parent(&self) -> Option<&Urn>;

    /// The resources that must exist before this one.
    fn dependencies(&self) -> BTreeSet<Urn>;

    fn kind(&self) -> &str {
        self.urn().kind()
    }

    fn name(&self) -> &str {
        self.urn().name()
    }

    fn output<T>(&self, attribute: &str) -> Output<T>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        self.urn().output(attribute)
    }
}

impl Describe for ResourceDescription {
    fn urn(&self) -> &Urn {
        &self.urn
    }

    fn parent(&self) -> Option<&Urn> {
        self.parent.as_ref()
    }

    fn dependencies(&self) -> BTreeSet<Urn> {
        let mut dependencies = self.depends_on.clone();
        for input in self.inputs.values() {
            dependencies.extend(input.dependencies());
        }
        dependencies.remove(&self.urn);
        dependencies
    }
}
