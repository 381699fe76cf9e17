//! Basic-shape states: geometry collection and shape-to-path synthesis.

extern crate alloc;

use alloc::format;
use alloc::vec::Vec;

use smallvec::SmallVec;
use svgtypes::Length;

use super::{FinalizeEnv, TransformationState};
use crate::attribute::AttributeTag;
use crate::context::Context;
use crate::element::ElementKind;
use crate::error::{DispatchError, ErrorPhase};
use crate::geom::PathCommand;
use crate::value::DomainValue;

const RECT_TAGS: &[AttributeTag] = &[
    AttributeTag::X,
    AttributeTag::Y,
    AttributeTag::Width,
    AttributeTag::Height,
    AttributeTag::Rx,
    AttributeTag::Ry,
];
const CIRCLE_TAGS: &[AttributeTag] = &[AttributeTag::Cx, AttributeTag::Cy, AttributeTag::R];
const ELLIPSE_TAGS: &[AttributeTag] = &[
    AttributeTag::Cx,
    AttributeTag::Cy,
    AttributeTag::Rx,
    AttributeTag::Ry,
];
const LINE_TAGS: &[AttributeTag] = &[
    AttributeTag::X1,
    AttributeTag::Y1,
    AttributeTag::X2,
    AttributeTag::Y2,
];
const POINTS_TAGS: &[AttributeTag] = &[AttributeTag::Points];

pub(super) fn geometry_tags(element: ElementKind) -> &'static [AttributeTag] {
    match element {
        ElementKind::Rect => RECT_TAGS,
        ElementKind::Circle => CIRCLE_TAGS,
        ElementKind::Ellipse => ELLIPSE_TAGS,
        ElementKind::Line => LINE_TAGS,
        ElementKind::Polyline | ElementKind::Polygon => POINTS_TAGS,
        _ => &[],
    }
}

/// Basic-shape geometry in user units.
#[derive(Clone, Debug, PartialEq)]
pub enum BasicShape {
    /// `<rect>` with effective corner radii.
    Rect {
        /// Left edge.
        x: f64,
        /// Top edge.
        y: f64,
        /// Width.
        width: f64,
        /// Height.
        height: f64,
        /// Effective horizontal corner radius.
        rx: f64,
        /// Effective vertical corner radius.
        ry: f64,
    },
    /// `<circle>`
    Circle {
        /// Center x.
        cx: f64,
        /// Center y.
        cy: f64,
        /// Radius.
        r: f64,
    },
    /// `<ellipse>`
    Ellipse {
        /// Center x.
        cx: f64,
        /// Center y.
        cy: f64,
        /// Horizontal radius.
        rx: f64,
        /// Vertical radius.
        ry: f64,
    },
    /// `<line>`
    Line {
        /// Start x.
        x1: f64,
        /// Start y.
        y1: f64,
        /// End x.
        x2: f64,
        /// End y.
        y2: f64,
    },
    /// `<polyline>`
    Polyline(Vec<(f64, f64)>),
    /// `<polygon>`
    Polygon(Vec<(f64, f64)>),
}

impl BasicShape {
    /// True when the shape has rounded corners (rects only).
    pub fn is_rounded_rect(&self) -> bool {
        matches!(self, Self::Rect { rx, ry, .. } if *rx > 0.0 && *ry > 0.0)
    }

    /// True when the shape has no area or no points and is not rendered.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Rect { width, height, .. } => *width == 0.0 || *height == 0.0,
            Self::Circle { r, .. } => *r == 0.0,
            Self::Ellipse { rx, ry, .. } => *rx == 0.0 || *ry == 0.0,
            Self::Line { .. } => false,
            Self::Polyline(points) | Self::Polygon(points) => points.is_empty(),
        }
    }

    /// Append the equivalent absolute path to `out`.
    pub fn to_path(&self, out: &mut Vec<PathCommand>) {
        match *self {
            Self::Rect {
                x,
                y,
                width,
                height,
                rx,
                ry,
            } => {
                if self.is_rounded_rect() {
                    rounded_rect_path(x, y, width, height, rx, ry, out);
                } else {
                    out.extend([
                        PathCommand::MoveTo { x, y },
                        PathCommand::LineTo { x: x + width, y },
                        PathCommand::LineTo {
                            x: x + width,
                            y: y + height,
                        },
                        PathCommand::LineTo { x, y: y + height },
                        PathCommand::ClosePath,
                    ]);
                }
            }
            Self::Circle { cx, cy, r } => ellipse_path(cx, cy, r, r, out),
            Self::Ellipse { cx, cy, rx, ry } => ellipse_path(cx, cy, rx, ry, out),
            Self::Line { x1, y1, x2, y2 } => out.extend([
                PathCommand::MoveTo { x: x1, y: y1 },
                PathCommand::LineTo { x: x2, y: y2 },
            ]),
            Self::Polyline(ref points) => points_path(points, false, out),
            Self::Polygon(ref points) => points_path(points, true, out),
        }
    }
}

fn quarter_arc(rx: f64, ry: f64, x: f64, y: f64) -> PathCommand {
    PathCommand::ArcTo {
        rx,
        ry,
        x_axis_rotation: 0.0,
        large_arc: false,
        sweep: true,
        x,
        y,
    }
}

fn rounded_rect_path(
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    rx: f64,
    ry: f64,
    out: &mut Vec<PathCommand>,
) {
    out.extend([
        PathCommand::MoveTo { x: x + rx, y },
        PathCommand::LineTo { x: x + w - rx, y },
        quarter_arc(rx, ry, x + w, y + ry),
        PathCommand::LineTo {
            x: x + w,
            y: y + h - ry,
        },
        quarter_arc(rx, ry, x + w - rx, y + h),
        PathCommand::LineTo { x: x + rx, y: y + h },
        quarter_arc(rx, ry, x, y + h - ry),
        PathCommand::LineTo { x, y: y + ry },
        quarter_arc(rx, ry, x + rx, y),
        PathCommand::ClosePath,
    ]);
}

fn ellipse_path(cx: f64, cy: f64, rx: f64, ry: f64, out: &mut Vec<PathCommand>) {
    out.extend([
        PathCommand::MoveTo { x: cx + rx, y: cy },
        quarter_arc(rx, ry, cx, cy + ry),
        quarter_arc(rx, ry, cx - rx, cy),
        quarter_arc(rx, ry, cx, cy - ry),
        quarter_arc(rx, ry, cx + rx, cy),
        PathCommand::ClosePath,
    ]);
}

fn points_path(points: &[(f64, f64)], close: bool, out: &mut Vec<PathCommand>) {
    let mut iter = points.iter();
    if let Some(&(x, y)) = iter.next() {
        out.push(PathCommand::MoveTo { x, y });
        out.extend(iter.map(|&(x, y)| PathCommand::LineTo { x, y }));
        if close {
            out.push(PathCommand::ClosePath);
        }
    }
}

/// Intercepted shape attributes, kept as parsed until finalization.
#[derive(Clone, Debug)]
struct ShapeGeometry {
    element: ElementKind,
    lengths: SmallVec<[(AttributeTag, Length); 6]>,
    points: Vec<(f64, f64)>,
}

impl ShapeGeometry {
    fn new(element: ElementKind) -> Self {
        Self {
            element,
            lengths: SmallVec::new(),
            points: Vec::new(),
        }
    }

    fn intercepts(&self, tag: AttributeTag) -> bool {
        geometry_tags(self.element).contains(&tag)
    }

    fn accept(&mut self, tag: AttributeTag, value: DomainValue<'_>) -> Result<(), DispatchError> {
        match value {
            DomainValue::Length(length) => {
                self.lengths.retain(|(t, _)| *t != tag);
                self.lengths.push((tag, length));
                Ok(())
            }
            DomainValue::Points(points) => {
                self.points = points;
                Ok(())
            }
            other => Err(DispatchError::new(
                ErrorPhase::Parse,
                "VALUE_PARSE_ERROR",
                format!("unexpected {:?} for shape geometry", other),
            )
            .with_element(self.element)
            .with_attribute(tag.name())),
        }
    }

    fn length(&self, tag: AttributeTag, env: &FinalizeEnv<'_>) -> Option<f64> {
        self.lengths
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, length)| env.lengths.to_user(*length, tag.length_direction()))
    }

    fn non_negative(
        &self,
        tag: AttributeTag,
        env: &FinalizeEnv<'_>,
    ) -> Result<f64, DispatchError> {
        let value = self.length(tag, env).unwrap_or(0.0);
        if value < 0.0 {
            return Err(DispatchError::new(
                ErrorPhase::Finalize,
                "SHAPE_NEGATIVE_SIZE",
                format!("negative {} ({})", tag, value),
            )
            .with_element(self.element)
            .with_attribute(tag.name()));
        }
        Ok(value)
    }

    fn resolve(&self, env: &FinalizeEnv<'_>) -> Result<BasicShape, DispatchError> {
        use AttributeTag as A;

        let coord = |tag| self.length(tag, env).unwrap_or(0.0);
        let shape = match self.element {
            ElementKind::Rect => {
                let width = self.non_negative(A::Width, env)?;
                let height = self.non_negative(A::Height, env)?;
                let auto = |tag| self.length(tag, env).filter(|v| *v >= 0.0);
                let (rx, ry) = match (auto(A::Rx), auto(A::Ry)) {
                    (Some(rx), Some(ry)) => (rx, ry),
                    (Some(r), None) | (None, Some(r)) => (r, r),
                    (None, None) => (0.0, 0.0),
                };
                BasicShape::Rect {
                    x: coord(A::X),
                    y: coord(A::Y),
                    width,
                    height,
                    rx: rx.min(width / 2.0),
                    ry: ry.min(height / 2.0),
                }
            }
            ElementKind::Circle => BasicShape::Circle {
                cx: coord(A::Cx),
                cy: coord(A::Cy),
                r: self.non_negative(A::R, env)?,
            },
            ElementKind::Ellipse => BasicShape::Ellipse {
                cx: coord(A::Cx),
                cy: coord(A::Cy),
                rx: self.non_negative(A::Rx, env)?,
                ry: self.non_negative(A::Ry, env)?,
            },
            ElementKind::Line => BasicShape::Line {
                x1: coord(A::X1),
                y1: coord(A::Y1),
                x2: coord(A::X2),
                y2: coord(A::Y2),
            },
            ElementKind::Polyline => BasicShape::Polyline(self.points.clone()),
            ElementKind::Polygon => BasicShape::Polygon(self.points.clone()),
            other => {
                return Err(DispatchError::new(
                    ErrorPhase::Finalize,
                    "SHAPE_UNSUPPORTED",
                    format!("{} is not a basic shape", other),
                )
                .with_element(other))
            }
        };
        Ok(shape)
    }
}

/// Collects a basic shape's geometry and emits it as one [`BasicShape`].
#[derive(Clone, Debug)]
pub struct CollectShapeState {
    geometry: ShapeGeometry,
}

impl CollectShapeState {
    /// State for one `element` of a basic-shape kind.
    pub fn new(element: ElementKind) -> Self {
        Self {
            geometry: ShapeGeometry::new(element),
        }
    }
}

impl TransformationState for CollectShapeState {
    fn name(&self) -> &'static str {
        "collect-shape"
    }

    fn intercepts(&self, tag: AttributeTag) -> bool {
        self.geometry.intercepts(tag)
    }

    fn accept(&mut self, tag: AttributeTag, value: DomainValue<'_>) -> Result<(), DispatchError> {
        self.geometry.accept(tag, value)
    }

    fn finalize(
        &mut self,
        context: &mut dyn Context,
        env: &FinalizeEnv<'_>,
    ) -> Result<(), DispatchError> {
        let shape = self.geometry.resolve(env)?;
        context.shape(shape);
        Ok(())
    }
}

/// Replaces a basic shape with an equivalent path.
#[derive(Clone, Debug)]
pub struct ShapeToPathState {
    geometry: ShapeGeometry,
    rounded_only: bool,
}

impl ShapeToPathState {
    /// State for one `element`; with `rounded_only`, square rects are collected instead.
    pub fn new(element: ElementKind, rounded_only: bool) -> Self {
        Self {
            geometry: ShapeGeometry::new(element),
            rounded_only,
        }
    }
}

impl TransformationState for ShapeToPathState {
    fn name(&self) -> &'static str {
        "shape-to-path"
    }

    fn intercepts(&self, tag: AttributeTag) -> bool {
        self.geometry.intercepts(tag)
    }

    fn accept(&mut self, tag: AttributeTag, value: DomainValue<'_>) -> Result<(), DispatchError> {
        self.geometry.accept(tag, value)
    }

    fn finalize(
        &mut self,
        context: &mut dyn Context,
        env: &FinalizeEnv<'_>,
    ) -> Result<(), DispatchError> {
        let shape = self.geometry.resolve(env)?;
        if shape.is_degenerate() {
            log::debug!("{} not rendered: {:?}", env.element, shape);
            return Ok(());
        }
        if self.rounded_only && matches!(shape, BasicShape::Rect { .. }) && !shape.is_rounded_rect()
        {
            context.shape(shape);
            return Ok(());
        }
        let mut commands = Vec::with_capacity(10);
        shape.to_path(&mut commands);
        for command in commands {
            context.path_command(command);
        }
        context.path_end();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LengthFactory;
    use crate::context::{Output, Recorder};
    use svgtypes::LengthUnit;

    fn px(n: f64) -> DomainValue<'static> {
        DomainValue::Length(Length::new(n, LengthUnit::None))
    }

    fn env(element: ElementKind, lengths: &LengthFactory) -> FinalizeEnv<'_> {
        FinalizeEnv {
            element,
            lengths,
            referencing_element: None,
            reference_size: None,
        }
    }

    fn rect(state: &mut dyn TransformationState, values: &[(AttributeTag, f64)]) {
        for &(tag, n) in values {
            state.accept(tag, px(n)).expect("accept");
        }
    }

    #[test]
    fn square_rect_becomes_closed_path_from_origin() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Rect, false);
        rect(
            &mut state,
            &[
                (AttributeTag::X, 0.0),
                (AttributeTag::Y, 0.0),
                (AttributeTag::Width, 10.0),
                (AttributeTag::Height, 5.0),
                (AttributeTag::Rx, 0.0),
                (AttributeTag::Ry, 0.0),
            ],
        );
        state
            .finalize(&mut recorder, &env(ElementKind::Rect, &lengths))
            .expect("finalize");
        assert_eq!(
            recorder.outputs,
            vec![
                Output::PathCommand(PathCommand::MoveTo { x: 0.0, y: 0.0 }),
                Output::PathCommand(PathCommand::LineTo { x: 10.0, y: 0.0 }),
                Output::PathCommand(PathCommand::LineTo { x: 10.0, y: 5.0 }),
                Output::PathCommand(PathCommand::LineTo { x: 0.0, y: 5.0 }),
                Output::PathCommand(PathCommand::ClosePath),
                Output::PathEnd,
            ]
        );
    }

    #[test]
    fn rounded_rect_has_four_clamped_quarter_arcs() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Rect, false);
        rect(
            &mut state,
            &[
                (AttributeTag::Width, 10.0),
                (AttributeTag::Height, 5.0),
                (AttributeTag::Rx, 2.0),
                (AttributeTag::Ry, 2.0),
            ],
        );
        state
            .finalize(&mut recorder, &env(ElementKind::Rect, &lengths))
            .expect("finalize");
        let arcs: Vec<_> = recorder
            .path_commands()
            .filter_map(|command| match command {
                PathCommand::ArcTo { rx, ry, .. } => Some((*rx, *ry)),
                _ => None,
            })
            .collect();
        assert_eq!(arcs, vec![(2.0, 2.0); 4]);
        assert_eq!(
            recorder.path_commands().next(),
            Some(&PathCommand::MoveTo { x: 2.0, y: 0.0 })
        );
        assert_eq!(
            recorder.path_commands().last(),
            Some(&PathCommand::ClosePath)
        );
    }

    #[test]
    fn corner_radius_auto_rule_and_clamp() {
        let lengths = LengthFactory::default();
        let resolve = |values: &[(AttributeTag, f64)]| {
            let mut geometry = ShapeGeometry::new(ElementKind::Rect);
            for &(tag, n) in values {
                geometry.accept(tag, px(n)).expect("accept");
            }
            geometry
                .resolve(&env(ElementKind::Rect, &lengths))
                .expect("resolve")
        };

        let only_rx = resolve(&[
            (AttributeTag::Width, 10.0),
            (AttributeTag::Height, 10.0),
            (AttributeTag::Rx, 3.0),
        ]);
        assert!(matches!(only_rx, BasicShape::Rect { rx, ry, .. } if rx == 3.0 && ry == 3.0));

        let negative_ry = resolve(&[
            (AttributeTag::Width, 10.0),
            (AttributeTag::Height, 10.0),
            (AttributeTag::Rx, 4.0),
            (AttributeTag::Ry, -1.0),
        ]);
        assert!(matches!(negative_ry, BasicShape::Rect { ry, .. } if ry == 4.0));

        let clamped = resolve(&[
            (AttributeTag::Width, 10.0),
            (AttributeTag::Height, 4.0),
            (AttributeTag::Rx, 8.0),
        ]);
        assert!(matches!(clamped, BasicShape::Rect { rx, ry, .. } if rx == 5.0 && ry == 2.0));
    }

    #[test]
    fn negative_size_is_reported() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = CollectShapeState::new(ElementKind::Rect);
        rect(&mut state, &[(AttributeTag::Width, -1.0)]);
        let err = state
            .finalize(&mut recorder, &env(ElementKind::Rect, &lengths))
            .expect_err("negative width");
        assert_eq!(err.code, "SHAPE_NEGATIVE_SIZE");
        assert!(recorder.outputs.is_empty());
    }

    #[test]
    fn zero_radius_circle_emits_nothing() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Circle, false);
        state.accept(AttributeTag::Cx, px(5.0)).expect("accept");
        state
            .finalize(&mut recorder, &env(ElementKind::Circle, &lengths))
            .expect("finalize");
        assert!(recorder.outputs.is_empty());
    }

    #[test]
    fn rounded_only_collects_square_rects() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Rect, true);
        rect(
            &mut state,
            &[(AttributeTag::Width, 4.0), (AttributeTag::Height, 4.0)],
        );
        state
            .finalize(&mut recorder, &env(ElementKind::Rect, &lengths))
            .expect("finalize");
        assert_eq!(
            recorder.outputs,
            vec![Output::Shape(BasicShape::Rect {
                x: 0.0,
                y: 0.0,
                width: 4.0,
                height: 4.0,
                rx: 0.0,
                ry: 0.0,
            })]
        );
    }

    #[test]
    fn rounded_only_skips_zero_sized_rects() {
        let lengths = LengthFactory::default();
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Rect, true);
        rect(
            &mut state,
            &[
                (AttributeTag::Width, 0.0),
                (AttributeTag::Height, 5.0),
                (AttributeTag::Ry, 2.0),
            ],
        );
        state
            .finalize(&mut recorder, &env(ElementKind::Rect, &lengths))
            .expect("finalize");
        assert!(recorder.outputs.is_empty());
    }

    #[test]
    fn polygon_closes_and_percentages_resolve() {
        let lengths = LengthFactory::default().with_viewport(200.0, 100.0);
        let mut recorder = Recorder::new();
        let mut state = ShapeToPathState::new(ElementKind::Polygon, false);
        state
            .accept(
                AttributeTag::Points,
                DomainValue::Points(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0)]),
            )
            .expect("accept");
        state
            .finalize(&mut recorder, &env(ElementKind::Polygon, &lengths))
            .expect("finalize");
        assert_eq!(recorder.path_commands().count(), 4);

        let mut line = CollectShapeState::new(ElementKind::Line);
        line.accept(
            AttributeTag::X2,
            DomainValue::Length(Length::new(50.0, LengthUnit::Percent)),
        )
        .expect("accept");
        let mut recorder = Recorder::new();
        line.finalize(&mut recorder, &env(ElementKind::Line, &lengths))
            .expect("finalize");
        assert_eq!(
            recorder.outputs,
            vec![Output::Shape(BasicShape::Line {
                x1: 0.0,
                y1: 0.0,
                x2: 100.0,
                y2: 0.0,
            })]
        );
    }
}
