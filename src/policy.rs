//! Policy resolver: validated configuration compiled into lookup tables.
//!
//! Every decision the dispatcher makes per attribute is precomputed here,
//! once, into a table keyed by `(element kind, attribute tag)`. Element kinds
//! also get their ordered transformation-state plan.

use smallvec::SmallVec;
use std::collections::BTreeMap;

use crate::attribute::AttributeTag;
use crate::config::{AttributeSelector, DispatchConfig, LengthFactory, ViewportMode};
use crate::element::{DispatchStrategy, ElementKind};
use crate::error::{DispatchError, ErrorPhase};
use crate::state::StateKind;
use crate::value::{value_type, ValueType};

/// Whether a processed attribute's value is parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueMode {
    /// Run the value grammar.
    Parsed,
    /// Forward the raw text.
    Passthrough,
}

/// What the dispatcher does with one resolved attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    /// Not processed; drop it.
    Skip,
    /// Forward the raw text to the consumer.
    Passthrough,
    /// Parse and forward to the consumer.
    Parse(ValueType),
    /// Parse and hand to a transformation state.
    Intercept(ValueType),
}

type StatePlan = SmallVec<[StateKind; 2]>;

/// Read-only dispatch policy shared by every dispatcher.
#[derive(Clone, Debug)]
pub struct Policy {
    config: DispatchConfig,
    handlers: BTreeMap<(ElementKind, AttributeTag), Handler>,
    plans: BTreeMap<ElementKind, StatePlan>,
}

fn matches_any(selectors: &[AttributeSelector], kind: ElementKind, tag: AttributeTag) -> bool {
    selectors.iter().any(|s| s.matches_pair(kind, tag))
        || selectors.iter().any(|s| s.matches_tag(tag))
}

impl Policy {
    /// Validate `config` and precompute the dispatch tables.
    pub fn new(config: DispatchConfig) -> Result<Self, DispatchError> {
        if !config.ignored.is_empty() && !config.processed.is_empty() {
            return Err(DispatchError::new(
                ErrorPhase::Config,
                "CONFIG_CONFLICT",
                "ignored and processed attribute sets are both non-empty",
            ));
        }
        if !config.lengths.is_valid() {
            return Err(DispatchError::new(
                ErrorPhase::Config,
                "CONFIG_INVALID",
                "length factory needs positive finite viewport, font size, x-height and dpi",
            ));
        }

        let mut policy = Self {
            config,
            handlers: BTreeMap::new(),
            plans: BTreeMap::new(),
        };
        for kind in ElementKind::ALL {
            let plan = policy.plan_for(kind);
            for &tag in AttributeTag::ALL {
                if !tag.applies_to(kind) {
                    continue;
                }
                let intercepted = plan
                    .iter()
                    .any(|state| state.intercepted_tags(kind).contains(&tag));
                let handler = policy.compute_handler(kind, tag, intercepted);
                policy.handlers.insert((kind, tag), handler);
            }
            if !plan.is_empty() {
                policy.plans.insert(kind, plan);
            }
        }
        log::debug!(
            "policy ready: {} handlers, {} planned element kinds",
            policy.handlers.len(),
            policy.plans.len()
        );
        Ok(policy)
    }

    fn plan_for(&self, kind: ElementKind) -> StatePlan {
        let mut plan = StatePlan::new();
        match kind.strategy() {
            DispatchStrategy::Viewport => match self.config.viewport {
                ViewportMode::Passthrough => {}
                ViewportMode::Calculate => plan.push(StateKind::ViewportRect),
                ViewportMode::AsTransform => plan.push(StateKind::ViewportTransform),
            },
            DispatchStrategy::BasicShape => {
                let shapes = &self.config.basic_shapes;
                if shapes.convert_to_path.contains(&kind) {
                    plan.push(StateKind::ShapeToPath {
                        rounded_only: kind == ElementKind::Rect
                            && shapes.convert_only_rounded_rect_to_path,
                    });
                } else if shapes.collect_attributes.contains(&kind) {
                    plan.push(StateKind::Collect);
                }
            }
            DispatchStrategy::Plain => {}
        }
        plan
    }

    fn compute_handler(&self, kind: ElementKind, tag: AttributeTag, intercepted: bool) -> Handler {
        if !self.is_processed(kind, tag) {
            return Handler::Skip;
        }
        match value_type(kind, tag) {
            Some(ty) if intercepted => Handler::Intercept(ty),
            Some(ty) if self.value_mode(kind, tag) == ValueMode::Parsed => Handler::Parse(ty),
            _ => Handler::Passthrough,
        }
    }

    /// True when `tag` on `kind` reaches the consumer or a state.
    ///
    /// With a non-empty processed set only listed attributes are processed;
    /// otherwise everything not ignored is. A selector matches either the
    /// exact `(kind, tag)` pair or the tag on any kind.
    pub fn is_processed(&self, kind: ElementKind, tag: AttributeTag) -> bool {
        if !self.config.processed.is_empty() {
            return matches_any(&self.config.processed, kind, tag);
        }
        !matches_any(&self.config.ignored, kind, tag)
    }

    /// Passthrough for attributes without a grammar or listed as passthrough.
    pub fn value_mode(&self, kind: ElementKind, tag: AttributeTag) -> ValueMode {
        if value_type(kind, tag).is_none() || matches_any(&self.config.passthrough, kind, tag) {
            ValueMode::Passthrough
        } else {
            ValueMode::Parsed
        }
    }

    /// Precomputed handler. Pairs where the tag does not apply are skipped.
    pub fn handler(&self, kind: ElementKind, tag: AttributeTag) -> Handler {
        self.handlers
            .get(&(kind, tag))
            .copied()
            .unwrap_or(Handler::Skip)
    }

    /// Ordered transformation states for `kind`.
    pub fn states_for(&self, kind: ElementKind) -> &[StateKind] {
        self.plans
            .get(&kind)
            .map(|plan| plan.as_slice())
            .unwrap_or(&[])
    }

    /// Unit conversion used at finalization.
    pub fn lengths(&self) -> &LengthFactory {
        &self.config.lengths
    }

    /// Element whose size svg/symbol viewports depend on.
    pub fn referencing_element(&self) -> Option<ElementKind> {
        self.config.referencing_element
    }

    /// The validated configuration.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}
