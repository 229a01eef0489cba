//! SVG Normalizer
//!
//! Three passes, always in this order, each mutating the document in place:
//! 1. cleanup: strip editor junk and non-drawing nodes, expand inline styles
//! 2. colors: rewrite paint values to `currentColor` where themeable
//! 3. optimize: round numbers, flatten groups, merge disjoint paths
//!
//! Any error aborts normalization of that one icon.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use thiserror::Error;

use crate::color::{parse_paint, Paint, IMPLICIT_BLACK};
use crate::path_data::{format_number, PathData, PathDataError};
use crate::svg::{Element, Node, SvgDocument};

pub const CURRENT_COLOR: &str = "currentColor";
pub const DEFAULT_PRECISION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeStep {
    Cleanup,
    Colors,
    Optimize,
}

impl fmt::Display for NormalizeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NormalizeStep::Cleanup => "cleanup",
            NormalizeStep::Colors => "colors",
            NormalizeStep::Optimize => "optimize",
        })
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),

    #[error("text content is not allowed inside <{0}>")]
    UnexpectedText(String),

    #[error("invalid path data in <{element}>: {source}")]
    PathData {
        element: String,
        #[source]
        source: PathDataError,
    },
}

impl NormalizeError {
    pub fn step(&self) -> NormalizeStep {
        match self {
            NormalizeError::UnsupportedElement(_) | NormalizeError::UnexpectedText(_) => {
                NormalizeStep::Cleanup
            }
            NormalizeError::PathData { .. } => NormalizeStep::Optimize,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Decimal places kept in coordinates and path data.
    pub precision: u8,
    /// Keep concrete colors of multi-color icon sets.
    pub keep_palette: bool,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            keep_palette: false,
        }
    }
}

const SUPPORTED_ELEMENTS: &[&str] = &[
    "a", "animate", "animateMotion", "animateTransform", "circle", "clipPath", "defs", "ellipse",
    "feBlend", "feColorMatrix", "feComponentTransfer", "feComposite", "feConvolveMatrix",
    "feDiffuseLighting", "feDisplacementMap", "feDistantLight", "feDropShadow", "feFlood",
    "feFuncA", "feFuncB", "feFuncG", "feFuncR", "feGaussianBlur", "feImage", "feMerge",
    "feMergeNode", "feMorphology", "feOffset", "fePointLight", "feSpecularLighting",
    "feSpotLight", "feTile", "feTurbulence", "filter", "g", "image", "line", "linearGradient",
    "marker", "mask", "mpath", "path", "pattern", "polygon", "polyline", "radialGradient",
    "rect", "set", "stop", "style", "svg", "switch", "symbol", "text", "textPath", "tspan", "use",
    "view",
];

const REMOVED_ELEMENTS: &[&str] = &["metadata", "title", "desc", "script"];

const TEXT_ELEMENTS: &[&str] = &["text", "tspan", "textPath", "style"];

const EDITOR_PREFIXES: &[&str] = &["sodipodi", "inkscape", "sketch", "serif", "rdf", "cc", "dc"];

/// Non-rendered containers; their content is only drawn when referenced.
const RESOURCE_ELEMENTS: &[&str] = &["defs", "clipPath", "mask", "pattern", "symbol", "marker"];

const SHAPE_ELEMENTS: &[&str] = &[
    "path", "rect", "circle", "ellipse", "polygon", "polyline", "text", "use",
];

const COLOR_ATTRIBUTES: &[&str] = &[
    "fill",
    "stroke",
    "stop-color",
    "flood-color",
    "lighting-color",
    "color",
];

/// Presentation attributes, inheritable unless listed in `NON_INHERITED`.
const PRESENTATION_ATTRIBUTES: &[&str] = &[
    "clip-path", "clip-rule", "color", "display", "fill", "fill-opacity", "fill-rule", "filter",
    "flood-color", "flood-opacity", "font-family", "font-size", "font-style", "font-weight",
    "lighting-color", "marker-end", "marker-mid", "marker-start", "mask", "opacity",
    "paint-order", "shape-rendering", "stop-color", "stop-opacity", "stroke",
    "stroke-dasharray", "stroke-dashoffset", "stroke-linecap", "stroke-linejoin",
    "stroke-miterlimit", "stroke-opacity", "stroke-width", "text-anchor", "vector-effect",
    "visibility",
];

const NON_INHERITED: &[&str] = &[
    "clip-path", "display", "filter", "flood-color", "flood-opacity", "lighting-color", "mask",
    "opacity", "stop-color", "stop-opacity", "vector-effect",
];

const DEFAULT_VALUES: &[(&str, &str)] = &[
    ("clip-rule", "nonzero"),
    ("display", "inline"),
    ("fill-opacity", "1"),
    ("fill-rule", "nonzero"),
    ("flood-opacity", "1"),
    ("opacity", "1"),
    ("stop-opacity", "1"),
    ("stroke", "none"),
    ("stroke-dasharray", "none"),
    ("stroke-dashoffset", "0"),
    ("stroke-linecap", "butt"),
    ("stroke-linejoin", "miter"),
    ("stroke-miterlimit", "4"),
    ("stroke-opacity", "1"),
    ("stroke-width", "1"),
    ("visibility", "visible"),
];

const NUMERIC_ATTRIBUTES: &[&str] = &[
    "cx", "cy", "fx", "fy", "height", "r", "rx", "ry", "stroke-width", "width", "x", "x1",
    "x2", "y", "y1", "y2",
];

/// Attributes that make two sibling paths unsafe to merge.
const UNMERGEABLE_ATTRIBUTES: &[&str] = &[
    "id", "marker-start", "marker-mid", "marker-end", "clip-path", "mask", "filter",
];

fn is_presentation(name: &str) -> bool {
    PRESENTATION_ATTRIBUTES.contains(&name)
}

fn is_inheritable(name: &str) -> bool {
    is_presentation(name) && !NON_INHERITED.contains(&name)
}

fn is_editor_name(name: &str) -> bool {
    name.split_once(':')
        .map_or(false, |(prefix, _)| EDITOR_PREFIXES.contains(&prefix))
}

/// Runs the fixed normalization pipeline.
pub struct Normalizer {
    options: NormalizeOptions,
}

impl Normalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    pub fn normalize(&self, svg: &mut SvgDocument) -> Result<(), NormalizeError> {
        self.cleanup(svg)?;
        self.rewrite_colors(svg, |_, _, _| {});
        self.optimize(svg)
    }

    // --- Cleanup ---

    pub fn cleanup(&self, svg: &mut SvgDocument) -> Result<(), NormalizeError> {
        let mut referenced = HashSet::new();
        let mut has_stylesheet = false;
        svg.root.walk(&mut |e| {
            if e.name == "style" {
                has_stylesheet = true;
            }
            for attr in &e.attributes {
                collect_references(&attr.name, &attr.value, &mut referenced);
            }
        });

        let ctx = CleanupContext {
            referenced,
            has_stylesheet,
        };

        expand_style(&mut svg.root);
        hoist_root_presentation(&mut svg.root);
        clean_children(&mut svg.root, &ctx, &HashSet::new(), false)
    }

    // --- Color rewrite ---

    /// Rewrites every paint attribute. `on_color` receives
    /// `(attribute, original, result)` for each visited value; an empty
    /// original means the default color was filled in.
    pub fn rewrite_colors(&self, svg: &mut SvgDocument, mut on_color: impl FnMut(&str, &str, &str)) {
        let mut palette = BTreeSet::new();
        svg.root.walk(&mut |e| {
            for attr in &e.attributes {
                if COLOR_ATTRIBUTES.contains(&attr.name.as_str()) {
                    if let Some(key) = parse_paint(&attr.value).and_then(|p| p.key()) {
                        palette.insert(key);
                    }
                }
            }
        });
        if paints_default_fill(&svg.root, false, false) {
            palette.insert(IMPLICIT_BLACK);
        }
        let themeable = !self.options.keep_palette && palette.len() == 1;

        rewrite_element_colors(&mut svg.root, themeable, &mut on_color);
        apply_default_fill(&mut svg.root, false, false, &mut on_color);
    }

    // --- Optimize ---

    pub fn optimize(&self, svg: &mut SvgDocument) -> Result<(), NormalizeError> {
        remove_hidden(&mut svg.root, false);
        round_numbers(&mut svg.root, self.options.precision)?;
        collapse_groups(&mut svg.root);
        merge_paths(&mut svg.root, self.options.precision)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizeOptions::default())
    }
}

struct CleanupContext {
    referenced: HashSet<String>,
    has_stylesheet: bool,
}

fn collect_references(name: &str, value: &str, out: &mut HashSet<String>) {
    if (name == "href" || name == "xlink:href") && value.starts_with('#') {
        out.insert(value[1..].to_string());
    }
    let mut rest = value;
    while let Some(start) = rest.find("url(") {
        rest = &rest[start + 4..];
        let Some(end) = rest.find(')') else { break };
        let target = rest[..end].trim().trim_matches(|c| c == '\'' || c == '"');
        if let Some(id) = target.strip_prefix('#') {
            out.insert(id.to_string());
        }
        rest = &rest[end..];
    }
}

/// Move `style` declarations that name presentation attributes onto the
/// element itself; unknown declarations stay in `style`.
fn expand_style(element: &mut Element) {
    let Some(style) = element.remove_attr("style") else {
        return;
    };
    let mut rest = Vec::new();
    for decl in style.split(';') {
        let Some((name, value)) = decl.split_once(':') else {
            continue;
        };
        let (name, value) = (name.trim().to_ascii_lowercase(), value.trim());
        if value.is_empty() {
            continue;
        }
        if is_presentation(&name) && !value.contains("!important") {
            element.set_attr(&name, value);
        } else {
            rest.push(format!("{}:{}", name, value));
        }
    }
    if !rest.is_empty() {
        element.set_attr("style", rest.join(";"));
    }
}

/// Root attributes never reach the exported body, so presentation
/// attributes on `<svg>` move into a wrapping group.
fn hoist_root_presentation(root: &mut Element) {
    let (hoisted, kept): (Vec<_>, Vec<_>) = root
        .attributes
        .drain(..)
        .partition(|a| is_presentation(&a.name));
    root.attributes = kept;
    if hoisted.is_empty() || root.children.is_empty() {
        return;
    }
    let mut group = Element::new("g");
    group.attributes = hoisted;
    group.children = std::mem::take(&mut root.children);
    root.children.push(Node::Element(group));
}

fn clean_children(
    parent: &mut Element,
    ctx: &CleanupContext,
    inherited: &HashSet<String>,
    in_resource: bool,
) -> Result<(), NormalizeError> {
    let allows_text = TEXT_ELEMENTS.contains(&parent.name.as_str());
    let mut kept = Vec::with_capacity(parent.children.len());

    for node in std::mem::take(&mut parent.children) {
        match node {
            Node::Comment(_) => {}
            Node::Text(text) if text.trim().is_empty() && !allows_text => {}
            Node::Text(_) if !allows_text => {
                return Err(NormalizeError::UnexpectedText(parent.name.clone()));
            }
            Node::Text(text) => kept.push(Node::Text(text)),
            Node::Element(mut child) => {
                if is_editor_name(&child.name) || REMOVED_ELEMENTS.contains(&child.name.as_str()) {
                    continue;
                }
                if !SUPPORTED_ELEMENTS.contains(&child.name.as_str()) {
                    return Err(NormalizeError::UnsupportedElement(child.name));
                }
                let child_in_resource =
                    in_resource || RESOURCE_ELEMENTS.contains(&child.name.as_str());

                expand_style(&mut child);
                clean_attributes(&mut child, ctx, inherited, child_in_resource);

                let mut scope = inherited.clone();
                scope.extend(
                    child
                        .attributes
                        .iter()
                        .filter(|a| is_inheritable(&a.name))
                        .map(|a| a.name.clone()),
                );
                clean_children(&mut child, ctx, &scope, child_in_resource)?;
                kept.push(Node::Element(child));
            }
        }
    }

    parent.children = kept;
    Ok(())
}

fn clean_attributes(
    element: &mut Element,
    ctx: &CleanupContext,
    inherited: &HashSet<String>,
    in_resource: bool,
) {
    element.attributes.retain(|attr| {
        let name = attr.name.as_str();
        if name == "xmlns" || name.starts_with("xmlns:") || is_editor_name(name) {
            return false;
        }
        if name.starts_with("on") || name.starts_with("data-") {
            return false;
        }
        if name == "id" {
            return ctx.referenced.contains(&attr.value);
        }
        if name == "class" {
            return ctx.has_stylesheet;
        }
        if in_resource || inherited.contains(name) {
            return true;
        }
        !DEFAULT_VALUES
            .iter()
            .any(|(n, v)| *n == name && attr.value.trim() == *v)
    });
}

// --- Color helpers ---

fn rewrite_value(value: &str, themeable: bool) -> Option<String> {
    let trimmed = value.trim();
    match parse_paint(trimmed) {
        Some(Paint::Reference) | Some(Paint::Inherit) => None,
        Some(Paint::Current) => (trimmed != CURRENT_COLOR).then(|| CURRENT_COLOR.to_string()),
        None => Some(CURRENT_COLOR.to_string()),
        Some(paint) if paint.is_empty() || themeable => Some(CURRENT_COLOR.to_string()),
        Some(_) => None,
    }
}

fn rewrite_element_colors(
    element: &mut Element,
    themeable: bool,
    on_color: &mut impl FnMut(&str, &str, &str),
) {
    for attr in element.attributes.iter_mut() {
        if !COLOR_ATTRIBUTES.contains(&attr.name.as_str()) {
            continue;
        }
        match rewrite_value(&attr.value, themeable) {
            Some(result) => {
                on_color(&attr.name, &attr.value, &result);
                attr.value = result;
            }
            None => on_color(&attr.name, &attr.value, &attr.value),
        }
    }
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            rewrite_element_colors(child, themeable, on_color);
        }
    }
}

fn needs_default_fill(element: &Element, fill_inherited: bool, in_resource: bool) -> bool {
    !in_resource && !fill_inherited && SHAPE_ELEMENTS.contains(&element.name.as_str())
}

/// Whether any rendered shape falls back to the implicit black fill.
fn paints_default_fill(element: &Element, fill_inherited: bool, in_resource: bool) -> bool {
    let in_resource = in_resource || RESOURCE_ELEMENTS.contains(&element.name.as_str());
    let has_fill = fill_inherited || element.has_attr("fill");
    if needs_default_fill(element, has_fill, in_resource) {
        return true;
    }
    element
        .elements()
        .any(|child| paints_default_fill(child, has_fill, in_resource))
}

/// Shapes that would paint with the implicit black fill get `currentColor`.
/// A `use` counts as a shape: its fill is inherited by what it draws.
fn apply_default_fill(
    element: &mut Element,
    fill_inherited: bool,
    in_resource: bool,
    on_color: &mut impl FnMut(&str, &str, &str),
) {
    let in_resource = in_resource || RESOURCE_ELEMENTS.contains(&element.name.as_str());
    let has_fill = fill_inherited || element.has_attr("fill");
    if needs_default_fill(element, has_fill, in_resource) {
        element.set_attr("fill", CURRENT_COLOR);
        on_color("fill", "", CURRENT_COLOR);
    }
    let has_fill = fill_inherited || element.has_attr("fill");
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            apply_default_fill(child, has_fill, in_resource, on_color);
        }
    }
}

// --- Optimize helpers ---

fn remove_hidden(element: &mut Element, in_resource: bool) {
    let in_resource = in_resource || RESOURCE_ELEMENTS.contains(&element.name.as_str());
    if !in_resource {
        element.children.retain(|node| match node {
            Node::Element(e) => e.attr("display").map(str::trim) != Some("none"),
            _ => true,
        });
    }
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            remove_hidden(child, in_resource);
        }
    }
}

fn round_numbers(element: &mut Element, precision: u8) -> Result<(), NormalizeError> {
    for attr in element.attributes.iter_mut() {
        let name = attr.name.as_str();
        if name == "d" {
            let path = PathData::parse(&attr.value).map_err(|source| NormalizeError::PathData {
                element: element.name.clone(),
                source,
            })?;
            attr.value = path.write(precision);
        } else if name == "points" {
            if let Some(points) = round_list(&attr.value, precision) {
                attr.value = points;
            }
        } else if NUMERIC_ATTRIBUTES.contains(&name) {
            if let Some(value) = parse_number(&attr.value) {
                attr.value = format_number(value, precision);
            }
        }
    }
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            round_numbers(child, precision)?;
        }
    }
    Ok(())
}

fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn round_list(value: &str, precision: u8) -> Option<String> {
    let numbers = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(parse_number)
        .collect::<Option<Vec<f64>>>()?;
    Some(
        numbers
            .iter()
            .map(|v| format_number(*v, precision))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Bottom-up: unwrap attribute-less groups, push inheritable group
/// attributes into a lone child, drop empty containers.
fn collapse_groups(element: &mut Element) {
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            collapse_groups(child);
        }
    }

    let mut result = Vec::with_capacity(element.children.len());
    for node in std::mem::take(&mut element.children) {
        let mut child = match node {
            Node::Element(child) => child,
            other => {
                result.push(other);
                continue;
            }
        };
        let is_container = child.name == "g" || child.name == "defs";
        if is_container && child.children.is_empty() && !child.has_attr("id") {
            continue;
        }
        if child.name == "g" && child.attributes.is_empty() {
            result.extend(child.children);
            continue;
        }
        if child.name == "g" && can_push_down(&child) {
            let attributes = std::mem::take(&mut child.attributes);
            if let Some(Node::Element(mut only)) = child.children.pop() {
                for attr in attributes {
                    only.set_attr(&attr.name, attr.value);
                }
                result.push(Node::Element(only));
                continue;
            }
        }
        result.push(Node::Element(child));
    }
    element.children = result;
}

fn can_push_down(group: &Element) -> bool {
    let [Node::Element(only)] = group.children.as_slice() else {
        return false;
    };
    group.attributes.iter().all(|a| is_inheritable(&a.name))
        && !group.attributes.iter().any(|a| only.has_attr(&a.name))
}

fn merge_paths(element: &mut Element, precision: u8) -> Result<(), NormalizeError> {
    for child in element.children.iter_mut() {
        if let Node::Element(child) = child {
            merge_paths(child, precision)?;
        }
    }
    if RESOURCE_ELEMENTS.contains(&element.name.as_str()) || element.name == "text" {
        return Ok(());
    }

    let mut result: Vec<Node> = Vec::with_capacity(element.children.len());
    for node in std::mem::take(&mut element.children) {
        if let (Some(Node::Element(previous)), Node::Element(current)) = (result.last_mut(), &node) {
            if mergeable(previous, current)? {
                let d = format!(
                    "{}{}",
                    previous.attr("d").unwrap_or_default(),
                    current.attr("d").unwrap_or_default()
                );
                let merged = PathData::parse(&d).map_err(|source| NormalizeError::PathData {
                    element: "path".to_string(),
                    source,
                })?;
                previous.set_attr("d", merged.write(precision));
                continue;
            }
        }
        result.push(node);
    }
    element.children = result;
    Ok(())
}

fn attributes_except_d(e: &Element) -> Vec<(&str, &str)> {
    let mut attrs: Vec<(&str, &str)> = e
        .attributes
        .iter()
        .filter(|attr| attr.name != "d")
        .map(|attr| (attr.name.as_str(), attr.value.as_str()))
        .collect();
    attrs.sort_unstable();
    attrs
}

fn mergeable(a: &Element, b: &Element) -> Result<bool, NormalizeError> {
    if a.name != "path" || b.name != "path" || !a.children.is_empty() || !b.children.is_empty() {
        return Ok(false);
    }
    let attrs = attributes_except_d(a);
    if attrs != attributes_except_d(b) || attrs.iter().any(|(n, _)| UNMERGEABLE_ATTRIBUTES.contains(n)) {
        return Ok(false);
    }

    let bounds = |e: &Element| -> Result<_, NormalizeError> {
        PathData::parse(e.attr("d").unwrap_or_default())
            .map(|p| p.bounds())
            .map_err(|source| NormalizeError::PathData {
                element: e.name.clone(),
                source,
            })
    };
    let (Some(first), Some(second)) = (bounds(a)?, bounds(b)?) else {
        return Ok(false);
    };
    let stroked = a.attr("stroke").map_or(false, |s| s.trim() != "none");
    let pad = if stroked {
        a.attr("stroke-width").and_then(parse_number).unwrap_or(1.0)
    } else {
        0.0
    };
    Ok(!first.expand(pad).overlaps(&second.expand(pad)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> SvgDocument {
        SvgDocument::parse(&format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24">{}</svg>"#,
            body
        ))
        .unwrap()
    }

    fn normalized(body: &str) -> String {
        let mut svg = doc(body);
        Normalizer::default().normalize(&mut svg).unwrap();
        svg.body()
    }

    #[test]
    fn test_cleanup_strips_editor_junk() {
        let mut svg = doc(concat!(
            "<!-- made in an editor --><title>Home</title><metadata><rdf:RDF/></metadata>",
            r##"<sodipodi:namedview pagecolor="#fff"/>"##,
            r#"<path id="unused" inkscape:label="x" data-name="p" onclick="go()" fill-opacity="1" d="M0 0h1v1z"/>"#
        ));
        Normalizer::default().cleanup(&mut svg).unwrap();
        assert_eq!(svg.body(), r#"<path d="M0 0h1v1z"/>"#);
    }

    #[test]
    fn test_cleanup_keeps_referenced_ids_and_inherited_overrides() {
        let mut svg = doc(concat!(
            r#"<defs><linearGradient id="g1"><stop offset="0" stop-opacity="1"/></linearGradient></defs>"#,
            r#"<g stroke-width="2"><path stroke-width="1" fill="url(#g1)" d="M0 0h1z"/></g>"#
        ));
        Normalizer::default().cleanup(&mut svg).unwrap();
        let body = svg.body();
        assert!(body.contains(r#"id="g1""#));
        assert!(body.contains(r#"stop-opacity="1""#));
        assert!(body.contains(r#"<path stroke-width="1""#));
    }

    #[test]
    fn test_cleanup_expands_style() {
        let mut svg = doc(r#"<path style="fill:#ff0000; stroke : none;mix-blend-mode:multiply" d="M0 0z"/>"#);
        Normalizer::default().cleanup(&mut svg).unwrap();
        let path = svg.root.elements().next().unwrap();
        assert_eq!(path.attr("fill"), Some("#ff0000"));
        assert_eq!(path.attr("stroke"), None);
        assert_eq!(path.attr("style"), Some("mix-blend-mode:multiply"));
    }

    #[test]
    fn test_cleanup_rejects_unsupported_elements() {
        let mut svg = doc("<foreignObject><div/></foreignObject>");
        let err = Normalizer::default().cleanup(&mut svg).unwrap_err();
        assert!(matches!(err, NormalizeError::UnsupportedElement(ref n) if n == "foreignObject"));
        assert_eq!(err.step(), NormalizeStep::Cleanup);
    }

    #[test]
    fn test_root_presentation_moves_into_body() {
        let body = {
            let mut svg = SvgDocument::parse(
                r##"<svg viewBox="0 0 24 24" fill="none" stroke="#000" stroke-width="2"><path d="M1 1L5 5"/><circle cx="12" cy="12" r="3"/></svg>"##,
            )
            .unwrap();
            Normalizer::default().normalize(&mut svg).unwrap();
            svg.body()
        };
        assert_eq!(
            body,
            r#"<g fill="currentColor" stroke="currentColor" stroke-width="2"><path d="M1 1L5 5"/><circle cx="12" cy="12" r="3"/></g>"#
        );
    }

    #[test]
    fn test_monochrome_color_becomes_current_color() {
        assert_eq!(
            normalized(r##"<path fill="#000000" d="M0 0h24v24H0z"/>"##),
            r#"<path fill="currentColor" d="M0 0h24v24H0z"/>"#
        );
    }

    #[test]
    fn test_palette_icon_keeps_colors() {
        let body = normalized(
            r##"<path fill="#f00" d="M0 0h2v2H0z"/><path fill="#00f" d="M10 10h2v2h-2z"/><path fill="transparent" d="M20 20h1v1h-1z"/>"##,
        );
        assert!(body.contains(r##"fill="#f00""##));
        assert!(body.contains(r##"fill="#00f""##));
        assert!(body.contains(r#"fill="currentColor""#));
    }

    #[test]
    fn test_implicit_black_counts_toward_palette() {
        let body = normalized(r##"<path fill="#f00" d="M0 0h2v2H0z"/><path d="M10 10h2v2h-2z"/>"##);
        assert_eq!(
            body,
            r##"<path fill="#f00" d="M0 0h2v2H0z"/><path d="M10 10h2v2h-2z" fill="currentColor"/>"##
        );
    }

    #[test]
    fn test_keep_palette_option_keeps_single_color() {
        let mut svg = doc(r##"<path fill="#123456" d="M0 0h1v1z"/>"##);
        let normalizer = Normalizer::new(NormalizeOptions {
            keep_palette: true,
            ..NormalizeOptions::default()
        });
        normalizer.normalize(&mut svg).unwrap();
        assert!(svg.body().contains(r##"fill="#123456""##));
    }

    #[test]
    fn test_default_fill_added_outside_resources() {
        let body = normalized(
            r#"<clipPath id="c"><rect width="4" height="4"/></clipPath><path clip-path="url(#c)" d="M0 0h4v4z"/>"#,
        );
        assert_eq!(
            body,
            r#"<clipPath id="c"><rect width="4" height="4"/></clipPath><path clip-path="url(#c)" d="M0 0h4v4z" fill="currentColor"/>"#
        );
    }

    #[test]
    fn test_use_gets_default_fill() {
        let body = normalized(r##"<defs><path id="p" d="M0 0h4v4H0z"/></defs><use href="#p"/>"##);
        assert_eq!(
            body,
            r##"<defs><path id="p" d="M0 0h4v4H0z"/></defs><use href="#p" fill="currentColor"/>"##
        );
    }

    #[test]
    fn test_link_and_switch_wrappers_survive() {
        let body = normalized(concat!(
            r#"<a href="https://example.com"><path d="M0 0h4v4H0z"/></a>"#,
            r#"<switch><circle cx="12" cy="12" r="3"/></switch>"#,
            r#"<view id="zoomed" viewBox="0 0 12 12"/>"#
        ));
        assert!(body.starts_with(r#"<a href="https://example.com"><path d="M0 0h4v4H0z" fill="currentColor"/></a>"#));
        assert!(body.contains(r#"<switch><circle cx="12" cy="12" r="3" fill="currentColor"/></switch>"#));
    }

    #[test]
    fn test_color_callback_reports_changes() {
        let mut svg = doc(r#"<path fill="bogus" stroke="none" d="M0 0z"/><path fill="none" d="M1 1z"/>"#);
        let normalizer = Normalizer::default();
        normalizer.cleanup(&mut svg).unwrap();
        let mut seen = Vec::new();
        normalizer.rewrite_colors(&mut svg, |attr, from, to| {
            seen.push(format!("{}:{}->{}", attr, from, to));
        });
        assert_eq!(
            seen,
            vec!["fill:bogus->currentColor", "fill:none->currentColor"]
        );
    }

    #[test]
    fn test_color_rewrite_is_idempotent() {
        let mut svg = doc(r##"<path fill="#333" stroke="#333" d="M0 0h1v1z"/>"##);
        let normalizer = Normalizer::default();
        normalizer.normalize(&mut svg).unwrap();
        let once = svg.body();
        normalizer.normalize(&mut svg).unwrap();
        assert_eq!(svg.body(), once);
        assert!(once.contains(r#"fill="currentColor" stroke="currentColor""#));
    }

    #[test]
    fn test_optimize_rounds_and_flattens() {
        let body = normalized(
            r#"<g><g fill="red"><rect x="1.23456" y="0.50000" width="10" height="10"/></g></g>"#,
        );
        assert_eq!(
            body,
            r#"<rect x="1.235" y=".5" width="10" height="10" fill="currentColor"/>"#
        );
    }

    #[test]
    fn test_optimize_merges_disjoint_paths_only() {
        let body = normalized(concat!(
            r#"<path d="M0 0h2v2H0z"/><path d="M10 10h2v2h-2z"/>"#,
            r#"<path d="M11 11h4v4h-4z"/>"#
        ));
        assert_eq!(
            body,
            r#"<path d="M0 0h2v2H0zM10 10h2v2h-2z" fill="currentColor"/><path d="M11 11h4v4h-4z" fill="currentColor"/>"#
        );
    }

    #[test]
    fn test_hidden_elements_removed() {
        let body = normalized(r#"<path display="none" d="M0 0z"/><path d="M1 1z"/>"#);
        assert_eq!(body, r#"<path d="M1 1z" fill="currentColor"/>"#);
    }

    #[test]
    fn test_bad_path_data_fails_in_optimize() {
        let mut svg = doc(r#"<path d="M0 0 L x y"/>"#);
        let err = Normalizer::default().normalize(&mut svg).unwrap_err();
        assert_eq!(err.step(), NormalizeStep::Optimize);
    }
}
