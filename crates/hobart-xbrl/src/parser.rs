//! Streaming parser for XBRL instance documents.
//!
//! Built on a `quick-xml` namespace-aware event loop. The reader never
//! resolves external entities, so the parser is not susceptible to
//! external-entity expansion. Parsing is conservative: structurally
//! malformed sub-elements (a context without an id, an arc with an
//! unparsable order) are skipped; only malformed XML fails the document.

use crate::error::{Result, XbrlError};
use crate::model::{
    XbrlContext, XbrlDimension, XbrlDocument, XbrlFact, XbrlLabel, XbrlLinkbases, XbrlPeriod,
    XbrlPresentationArc, XbrlUnit,
};
use chrono::NaiveDate;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use std::collections::{BTreeMap, HashMap};

/// Parser for raw XBRL (or Inline XBRL) content.
#[derive(Debug, Clone, Default)]
pub struct XbrlParser {}

impl XbrlParser {
    /// Creates a new parser.
    pub const fn new() -> Self {
        Self {}
    }

    /// Parse raw XBRL bytes into an [`XbrlDocument`].
    ///
    /// # Errors
    ///
    /// Returns [`XbrlError::EmptyAccessionId`] when the accession id is
    /// blank, [`XbrlError::Xml`] when the content is not well-formed XML,
    /// and [`XbrlError::InvalidDate`] when a context period date is not an
    /// ISO calendar date.
    pub fn parse(&self, accession_id: &str, content: &[u8]) -> Result<XbrlDocument> {
        if accession_id.trim().is_empty() {
            return Err(XbrlError::EmptyAccessionId);
        }

        let mut reader = NsReader::from_reader(content);
        reader.config_mut().trim_text(true);

        let mut state = ParseState::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_resolved_event_into(&mut buf) {
                Ok((ns, Event::Start(ref e))) => {
                    let local = local_name(e);
                    state.handle_start(e, namespace_of(&ns), &local, false)?;
                    state.stack.push(local);
                }
                Ok((ns, Event::Empty(ref e))) => {
                    let local = local_name(e);
                    state.handle_start(e, namespace_of(&ns), &local, true)?;
                }
                Ok((_, Event::Text(ref t))) => {
                    let text = t
                        .unescape()
                        .map_err(|err| XbrlError::Xml(err.to_string()))?;
                    state.handle_text(&text);
                }
                Ok((_, Event::CData(ref t))) => {
                    state.handle_text(&String::from_utf8_lossy(t));
                }
                Ok((_, Event::End(_))) => {
                    let Some(local) = state.stack.pop() else {
                        return Err(XbrlError::Xml("unbalanced end tag".to_string()));
                    };
                    state.handle_end(&local)?;
                }
                Ok((_, Event::Eof)) => break,
                Ok(_) => {}
                Err(err) => return Err(XbrlError::Xml(err.to_string())),
            }
            buf.clear();
        }

        if !state.saw_root {
            return Err(XbrlError::Xml("document has no root element".to_string()));
        }
        if !state.stack.is_empty() {
            return Err(XbrlError::Xml(format!(
                "unexpected end of document: {} unclosed element(s)",
                state.stack.len()
            )));
        }

        Ok(XbrlDocument {
            accession_id: accession_id.to_string(),
            contexts: state.contexts,
            units: state.units,
            facts: state.facts,
            linkbases: XbrlLinkbases {
                labels_by_concept: state.labels_by_concept,
                presentation_arcs: state.presentation_arcs,
            },
        })
    }

    /// Parse raw XBRL text into an [`XbrlDocument`].
    ///
    /// # Errors
    ///
    /// See [`XbrlParser::parse`].
    pub fn parse_str(&self, accession_id: &str, content: &str) -> Result<XbrlDocument> {
        self.parse(accession_id, content.as_bytes())
    }
}

// ------------------------------------------------------------------------
// Event-loop state
// ------------------------------------------------------------------------

/// Destination for accumulated character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    EntityIdentifier,
    Instant,
    StartDate,
    EndDate,
    Measure,
    DimensionMember,
    LabelText,
    FactValue,
}

#[derive(Debug, Default)]
struct ContextBuilder {
    id: Option<String>,
    entity_identifier: String,
    instant: Option<String>,
    start: Option<String>,
    end: Option<String>,
    in_segment: bool,
    pending_dimension: Option<String>,
    dimensions: Vec<XbrlDimension>,
}

#[derive(Debug, Default)]
struct UnitBuilder {
    id: Option<String>,
    measure: Option<String>,
}

#[derive(Debug, Default)]
struct LabelLinkBuilder {
    locs: HashMap<String, String>,
    resources: HashMap<String, (String, String)>,
    pending_resource: Option<(String, String)>,
    arcs: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct PresentationLinkBuilder {
    role: String,
    locs: HashMap<String, String>,
    arcs: Vec<(String, String, String)>,
}

#[derive(Debug)]
struct FactBuilder {
    local: String,
    id: Option<String>,
    concept: String,
    context_ref: String,
    unit_ref: Option<String>,
    decimals: Option<u32>,
    precision: Option<u32>,
    is_nil: bool,
}

#[derive(Debug, Default)]
struct ParseState {
    stack: Vec<String>,
    saw_root: bool,

    context: Option<ContextBuilder>,
    unit: Option<UnitBuilder>,
    label_link: Option<LabelLinkBuilder>,
    presentation_link: Option<PresentationLinkBuilder>,
    fact: Option<FactBuilder>,

    capture: Option<Capture>,
    text: String,

    contexts: BTreeMap<String, XbrlContext>,
    units: BTreeMap<String, XbrlUnit>,
    facts: Vec<XbrlFact>,
    labels_by_concept: BTreeMap<String, Vec<XbrlLabel>>,
    presentation_arcs: Vec<XbrlPresentationArc>,
}

impl ParseState {
    fn handle_start(
        &mut self,
        e: &BytesStart<'_>,
        namespace: Option<String>,
        local: &str,
        is_empty: bool,
    ) -> Result<()> {
        if self.stack.is_empty() {
            self.saw_root = true;
        }

        if let Some(link) = self.label_link.as_mut() {
            match local {
                "loc" => {
                    if let (Some(label), Some(href)) = (attr(e, "label"), attr(e, "href"))
                        && let Some(concept) = concept_from_href(&href)
                    {
                        link.locs.insert(label, concept);
                    }
                }
                "label" => {
                    let is_resource = attr(e, "type").as_deref() == Some("resource");
                    if is_resource && !is_empty {
                        if let Some(label) = attr(e, "label") {
                            let role = attr(e, "role").unwrap_or_default();
                            link.pending_resource = Some((label, role));
                            self.begin_capture(Capture::LabelText);
                        }
                    }
                }
                "labelArc" => {
                    if let (Some(from), Some(to)) = (attr(e, "from"), attr(e, "to")) {
                        link.arcs.push((from, to));
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(link) = self.presentation_link.as_mut() {
            match local {
                "loc" => {
                    if let (Some(label), Some(href)) = (attr(e, "label"), attr(e, "href"))
                        && let Some(concept) = concept_from_href(&href)
                    {
                        link.locs.insert(label, concept);
                    }
                }
                "presentationArc" => {
                    if let (Some(from), Some(to)) = (attr(e, "from"), attr(e, "to")) {
                        let order = attr(e, "order").unwrap_or_else(|| "0".to_string());
                        link.arcs.push((from, to, order));
                    }
                }
                _ => {}
            }
            return Ok(());
        }

        if let Some(ctx) = self.context.as_mut() {
            match local {
                // Self-closing leaf elements carry no text; starting a
                // capture for them would leak into unrelated elements.
                _ if is_empty => {}
                "identifier" => self.begin_capture(Capture::EntityIdentifier),
                "instant" => self.begin_capture(Capture::Instant),
                "startDate" => self.begin_capture(Capture::StartDate),
                "endDate" => self.begin_capture(Capture::EndDate),
                "segment" => ctx.in_segment = true,
                _ => {
                    if ctx.in_segment
                        && !is_empty
                        && let Some(dimension) = attr(e, "dimension")
                    {
                        ctx.pending_dimension = Some(dimension);
                        self.begin_capture(Capture::DimensionMember);
                    }
                }
            }
            return Ok(());
        }

        if self.unit.is_some() {
            if local == "measure" && !is_empty {
                self.begin_capture(Capture::Measure);
            }
            return Ok(());
        }

        // Text nested inside an open fact element is part of the fact value;
        // child elements themselves are not interpreted.
        if self.fact.is_some() {
            return Ok(());
        }

        match local {
            "context" if !is_empty => {
                self.context = Some(ContextBuilder {
                    id: attr(e, "id"),
                    ..ContextBuilder::default()
                });
            }
            "unit" if !is_empty => {
                self.unit = Some(UnitBuilder {
                    id: attr(e, "id"),
                    measure: None,
                });
            }
            "labelLink" if !is_empty => {
                self.label_link = Some(LabelLinkBuilder::default());
            }
            "presentationLink" if !is_empty => {
                self.presentation_link = Some(PresentationLinkBuilder {
                    role: attr(e, "role").unwrap_or_default(),
                    ..PresentationLinkBuilder::default()
                });
            }
            _ => {
                // Candidate fact: a namespaced direct child of the root with
                // a context reference.
                if self.stack.len() == 1
                    && let Some(namespace) = namespace
                    && let Some(context_ref) = attr(e, "contextRef")
                {
                    let builder = FactBuilder {
                        local: local.to_string(),
                        id: attr(e, "id"),
                        concept: concept_qname(&namespace, local),
                        context_ref,
                        unit_ref: attr(e, "unitRef"),
                        decimals: attr(e, "decimals").and_then(|v| v.parse::<u32>().ok()),
                        precision: attr(e, "precision").and_then(|v| v.parse::<u32>().ok()),
                        is_nil: attr(e, "nil").as_deref() == Some("true"),
                    };
                    if is_empty {
                        self.push_fact(builder, String::new());
                    } else {
                        self.fact = Some(builder);
                        self.begin_capture(Capture::FactValue);
                    }
                }
            }
        }

        Ok(())
    }

    fn handle_text(&mut self, text: &str) {
        if self.capture.is_some() {
            self.text.push_str(text);
        }
    }

    fn handle_end(&mut self, local: &str) -> Result<()> {
        if let Some(capture) = self.capture {
            let finished = match (capture, local) {
                (Capture::EntityIdentifier, "identifier")
                | (Capture::Instant, "instant")
                | (Capture::StartDate, "startDate")
                | (Capture::EndDate, "endDate")
                | (Capture::Measure, "measure")
                | (Capture::LabelText, "label") => true,
                (Capture::DimensionMember, _) => true,
                (Capture::FactValue, _) => {
                    self.fact.as_ref().is_some_and(|f| f.local == local) && self.stack.len() == 1
                }
                _ => false,
            };
            if finished {
                let text = std::mem::take(&mut self.text);
                self.capture = None;
                self.finish_capture(capture, text);
                if capture != Capture::FactValue {
                    return Ok(());
                }
            }
        }

        match local {
            "context" => {
                if let Some(builder) = self.context.take() {
                    self.finish_context(builder)?;
                }
            }
            "segment" => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.in_segment = false;
                }
            }
            "unit" => {
                if let Some(builder) = self.unit.take() {
                    self.finish_unit(builder);
                }
            }
            "labelLink" => {
                if let Some(builder) = self.label_link.take() {
                    self.finish_label_link(builder);
                }
            }
            "presentationLink" => {
                if let Some(builder) = self.presentation_link.take() {
                    self.finish_presentation_link(builder);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn begin_capture(&mut self, capture: Capture) {
        self.capture = Some(capture);
        self.text.clear();
    }

    fn finish_capture(&mut self, capture: Capture, text: String) {
        match capture {
            Capture::EntityIdentifier => {
                if let Some(ctx) = self.context.as_mut() {
                    ctx.entity_identifier = text.trim().to_string();
                }
            }
            Capture::Instant => {
                if let Some(ctx) = self.context.as_mut() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        ctx.instant = Some(trimmed.to_string());
                    }
                }
            }
            Capture::StartDate => {
                if let Some(ctx) = self.context.as_mut() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        ctx.start = Some(trimmed.to_string());
                    }
                }
            }
            Capture::EndDate => {
                if let Some(ctx) = self.context.as_mut() {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        ctx.end = Some(trimmed.to_string());
                    }
                }
            }
            Capture::Measure => {
                if let Some(unit) = self.unit.as_mut()
                    && unit.measure.is_none()
                {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        unit.measure = Some(trimmed.to_string());
                    }
                }
            }
            Capture::DimensionMember => {
                if let Some(ctx) = self.context.as_mut()
                    && let Some(dimension) = ctx.pending_dimension.take()
                {
                    let member = text.trim();
                    if !member.is_empty() {
                        ctx.dimensions.push(XbrlDimension {
                            dimension,
                            member: member.to_string(),
                        });
                    }
                }
            }
            Capture::LabelText => {
                if let Some(link) = self.label_link.as_mut()
                    && let Some((label, role)) = link.pending_resource.take()
                {
                    let trimmed = text.trim();
                    if !trimmed.is_empty() {
                        link.resources.insert(label, (role, trimmed.to_string()));
                    }
                }
            }
            Capture::FactValue => {
                if let Some(builder) = self.fact.take() {
                    self.push_fact(builder, text);
                }
            }
        }
    }

    fn finish_context(&mut self, builder: ContextBuilder) -> Result<()> {
        // A context without an id can never be referenced; skip it.
        let Some(id) = builder.id else {
            return Ok(());
        };

        let period = if let Some(instant) = builder.instant {
            XbrlPeriod::Instant {
                date: Some(parse_date(&instant)?),
            }
        } else {
            XbrlPeriod::Duration {
                start: builder.start.as_deref().map(parse_date).transpose()?,
                end: builder.end.as_deref().map(parse_date).transpose()?,
            }
        };

        self.contexts.insert(
            id.clone(),
            XbrlContext {
                id,
                entity_identifier: builder.entity_identifier,
                period,
                dimensions: builder.dimensions,
            },
        );
        Ok(())
    }

    fn finish_unit(&mut self, builder: UnitBuilder) {
        let Some(id) = builder.id else {
            return;
        };
        let measure = builder.measure.unwrap_or_else(|| "pure".to_string());
        self.units.insert(id.clone(), XbrlUnit { id, measure });
    }

    fn finish_label_link(&mut self, builder: LabelLinkBuilder) {
        for (from, to) in &builder.arcs {
            let Some(concept) = builder.locs.get(from) else {
                continue;
            };
            let Some((role, text)) = builder.resources.get(to) else {
                continue;
            };
            self.labels_by_concept
                .entry(concept.clone())
                .or_default()
                .push(XbrlLabel {
                    concept: concept.clone(),
                    role: role.clone(),
                    text: text.clone(),
                });
        }
    }

    fn finish_presentation_link(&mut self, builder: PresentationLinkBuilder) {
        for (from, to, order_raw) in &builder.arcs {
            let Some(parent) = builder.locs.get(from) else {
                continue;
            };
            let Some(child) = builder.locs.get(to) else {
                continue;
            };
            // A malformed order drops this single arc, never the parse.
            let Ok(order) = order_raw.parse::<f64>() else {
                continue;
            };
            if !order.is_finite() {
                continue;
            }
            self.presentation_arcs.push(XbrlPresentationArc {
                role: builder.role.clone(),
                parent: parent.clone(),
                child: child.clone(),
                order,
            });
        }
    }

    fn push_fact(&mut self, builder: FactBuilder, raw_value: String) {
        self.facts.push(XbrlFact {
            id: builder.id,
            concept: builder.concept,
            context_ref: builder.context_ref,
            unit_ref: builder.unit_ref,
            raw_value: raw_value.trim().to_string(),
            decimals: builder.decimals,
            precision: builder.precision,
            is_nil: builder.is_nil,
            footnote_refs: Vec::new(),
        });
    }
}

// ------------------------------------------------------------------------
// Helpers
// ------------------------------------------------------------------------

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().local_name().as_ref()).into_owned()
}

fn namespace_of(ns: &ResolveResult<'_>) -> Option<String> {
    match ns {
        ResolveResult::Bound(namespace) => {
            Some(String::from_utf8_lossy(namespace.into_inner()).into_owned())
        }
        _ => None,
    }
}

/// Find an attribute by local name, ignoring any namespace prefix.
fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes().flatten().find_map(|a| {
        (a.key.local_name().as_ref() == name.as_bytes())
            .then(|| String::from_utf8_lossy(&a.value).into_owned())
    })
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| XbrlError::InvalidDate {
        value: text.to_string(),
    })
}

/// Best-effort concept QName for a fact element.
///
/// Namespace URIs containing `us-gaap` or `ifrs` map to the well-known
/// `us-gaap:` / `ifrs-full:` prefixes; anything else falls back to the
/// bare local name.
fn concept_qname(namespace: &str, local: &str) -> String {
    let lower = namespace.to_ascii_lowercase();
    if lower.contains("us-gaap") {
        format!("us-gaap:{local}")
    } else if lower.contains("ifrs") {
        format!("ifrs-full:{local}")
    } else {
        local.to_string()
    }
}

/// Best-effort concept QName extraction from a linkbase locator href.
///
/// Fragments with an explicit prefix (`us-gaap:Revenues`) are used as-is;
/// `us-gaap_Revenues` style fragments are rewritten at the first
/// underscore; anything else is returned verbatim.
fn concept_from_href(href: &str) -> Option<String> {
    let (_, fragment) = href.split_once('#')?;
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return None;
    }

    if fragment.contains(':') {
        return Some(fragment.to_string());
    }

    if let Some((prefix, local)) = fragment.split_once('_')
        && !prefix.is_empty()
        && !local.is_empty()
    {
        return Some(format!("{prefix}:{local}"));
    }

    Some(fragment.to_string())
}
