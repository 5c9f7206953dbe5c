use crate::error::{self, Result};
use crate::resource::Urn;
use crate::state::State;
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use snafu::{OptionExt, ResultExt};
use std::collections::BTreeSet;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// A pointer to an output attribute of a described resource. Dots in `attribute` descend into
/// nested objects, e.g. `certificateAuthority.data`.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Reference {
    urn: Urn,
    attribute: String,
}

impl Reference {
    pub fn new<S: Into<String>>(urn: Urn, attribute: S) -> Self {
        Self {
            urn,
            attribute: attribute.into(),
        }
    }

    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Find the referenced value in `state`, if the engine has provided it.
    pub fn lookup<'a>(&self, state: &'a State) -> Option<&'a Value> {
        let mut path = self.attribute.split('.');
        let first = path.next()?;
        let mut value = state.attributes(&self.urn)?.get(first)?;
        for key in path {
            value = value.as_object()?.get(key)?;
        }
        Some(value)
    }
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${{{}.{}}}", self.urn, self.attribute)
    }
}

type Eval<T> = Arc<dyn Fn(&State) -> Result<T> + Send + Sync>;

fn eval<T, F>(f: F) -> Eval<T>
where
    F: Fn(&State) -> Result<T> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// How an output came to be, used when rendering it into a plan.
#[derive(Clone, Debug)]
enum Shape {
    Known(Value),
    Reference(Reference),
    Computed,
}

/// A value of type `T` that may not be known until the resources it is derived from have been
/// created. An `Output` is never read directly: it is resolved against a [`State`] that an engine
/// fills in, and transformations over it (`map`, `zip`, `all`) are deferred until then.
pub struct Output<T> {
    shape: Shape,
    sources: BTreeSet<Reference>,
    eval: Eval<T>,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            shape: self.shape.clone(),
            sources: self.sources.clone(),
            eval: Arc::clone(&self.eval),
        }
    }
}

impl<T> Debug for Output<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("shape", &self.shape)
            .field("sources", &self.sources)
            .finish()
    }
}

impl<T> Output<T>
where
    T: Send + Sync + 'static,
{
    /// An output whose value is already known.
    pub fn known(value: T) -> Self
    where
        T: Serialize + Clone,
    {
        let shape = match serde_json::to_value(&value) {
            Ok(rendered) => Shape::Known(rendered),
            Err(e) => {
                warn!("Unable to render a known value, it will be reported in the plan: {}", e);
                Shape::Computed
            }
        };
        Self {
            shape,
            sources: BTreeSet::new(),
            eval: eval(move |_| Ok(value.clone())),
        }
    }

    /// An output that will hold the referenced resource attribute.
    pub fn reference(reference: Reference) -> Self
    where
        T: DeserializeOwned,
    {
        let sources = BTreeSet::from([reference.clone()]);
        let target = reference.clone();
        Self {
            shape: Shape::Reference(reference),
            sources,
            eval: eval(move |state| {
                let value = target.lookup(state).context(error::UnresolvedSnafu {
                    reference: target.to_string(),
                })?;
                Ok(
                    serde_json::from_value(value.clone()).context(error::DeserializeSnafu {
                        reference: target.to_string(),
                    })?,
                )
            }),
        }
    }

    /// The resource attributes this output is derived from.
    pub fn sources(&self) -> &BTreeSet<Reference> {
        &self.sources
    }

    /// Evaluate the output. Fails with an unresolved error if any attribute it is derived from is
    /// missing from `state`.
    pub fn resolve(&self, state: &State) -> Result<T> {
        (self.eval)(state)
    }

    /// Defer `f` until the value is available.
    pub fn map<U, F>(self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let inner = self.eval;
        Output {
            shape: Shape::Computed,
            sources: self.sources,
            eval: eval(move |state| inner(state).map(&f)),
        }
    }

    /// Defer a fallible `f` until the value is available. An error returned by `f` surfaces when the
    /// output is resolved.
    pub fn try_map<U, E, F>(self, f: F) -> Output<U>
    where
        U: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        F: Fn(T) -> std::result::Result<U, E> + Send + Sync + 'static,
    {
        let inner = self.eval;
        Output {
            shape: Shape::Computed,
            sources: self.sources,
            eval: eval(move |state| {
                let value = inner(state)?;
                Ok(f(value)
                    .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
                    .context(error::TransformSnafu)?)
            }),
        }
    }

    /// Combine two outputs into one that resolves once both have resolved.
    pub fn zip<U>(self, other: Output<U>) -> Output<(T, U)>
    where
        U: Send + Sync + 'static,
    {
        let left = self.eval;
        let right = other.eval;
        let mut sources = self.sources;
        sources.extend(other.sources);
        Output {
            shape: Shape::Computed,
            sources,
            eval: eval(move |state| Ok((left(state)?, right(state)?))),
        }
    }

    /// Combine any number of outputs into one that resolves once all of them have resolved.
    pub fn all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        let outputs: Vec<Output<T>> = outputs.into_iter().collect();
        let sources = outputs
            .iter()
            .flat_map(|output| output.sources.iter().cloned())
            .collect();
        let evals: Vec<Eval<T>> = outputs.into_iter().map(|output| output.eval).collect();
        Output {
            shape: Shape::Computed,
            sources,
            eval: eval(move |state| evals.iter().map(|e| e(state)).collect()),
        }
    }

    /// Erase the type of the output so that it can be used as a resource input.
    pub fn into_value(self) -> Output<Value>
    where
        T: Serialize,
    {
        let inner = self.eval;
        Output {
            shape: self.shape,
            sources: self.sources,
            eval: eval(move |state| {
                Ok(serde_json::to_value(inner(state)?).context(error::SerializeSnafu)?)
            }),
        }
    }
}

impl Output<Value> {
    /// Render the output for a plan document. Known values are rendered as themselves, references
    /// as `${kind::name.attribute}` and computed values as `${computed(<references>)}`. A computed
    /// value that depends on no resource is evaluated.
    pub(crate) fn render(&self) -> Value {
        match &self.shape {
            Shape::Known(value) => value.clone(),
            Shape::Reference(reference) => Value::String(reference.to_string()),
            Shape::Computed if self.sources.is_empty() => self
                .resolve(&State::default())
                .unwrap_or_else(|e| Value::String(format!("${{error({})}}", e))),
            Shape::Computed => Value::String(format!(
                "${{computed({})}}",
                self.sources
                    .iter()
                    .map(|reference| format!("{}.{}", reference.urn(), reference.attribute()))
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        }
    }
}
