// ABOUTME: The feature evaluator: applies a CriteriaSet to a ParsedDocument and produces a FeatureRow.
// ABOUTME: Counts matched nodes (optionally text-filtered) and concatenates matched text in document order.

//! Criteria evaluation.
//!
//! Key behaviors:
//! - A count criterion yields the size of its node-set, or, with a text filter,
//!   the number of nodes whose text the filter accepts.
//! - A content criterion yields the concatenated text of its node-set in
//!   document order.
//! - The text of an element is its leading text, i.e. the text before its first
//!   child node. Text, attribute, comment and processing-instruction nodes use
//!   their value. The root and namespace nodes have no text and contribute the
//!   empty string.
//! - An expression that does not produce a node-set is an evaluation error.

use sxd_document::dom::ChildOfElement;
use sxd_xpath::nodeset::Node;
use sxd_xpath::{Context, Value};

use crate::criteria::compiled::CompiledXPath;
use crate::criteria::CriteriaSet;
use crate::document::ParsedDocument;
use crate::error::ExtractError;
use crate::row::FeatureRow;

/// Evaluates every criterion in `criteria` against `doc`.
pub fn extract_features(
    criteria: &CriteriaSet,
    doc: &ParsedDocument,
) -> Result<FeatureRow, ExtractError> {
    let document = doc.document();
    let root = document.root();
    let context = Context::new();
    let mut row = FeatureRow::new();

    for criterion in criteria.count_criteria() {
        let nodes = select_nodes(&criterion.name, &criterion.xpath, &context, root)?;
        let count = match &criterion.filter {
            Some(filter) => nodes
                .iter()
                .filter(|node| filter.accepts(node_text(node).unwrap_or("")))
                .count(),
            None => nodes.len(),
        };
        row.insert(criterion.name.as_str(), count);
    }

    for criterion in criteria.content_criteria() {
        let nodes = select_nodes(&criterion.name, &criterion.xpath, &context, root)?;
        let text: String = nodes
            .iter()
            .map(|node| node_text(node).unwrap_or(""))
            .collect();
        row.insert(criterion.name.as_str(), text);
    }

    Ok(row)
}

fn select_nodes<'d>(
    name: &str,
    xpath: &CompiledXPath,
    context: &Context<'d>,
    root: sxd_document::dom::Root<'d>,
) -> Result<Vec<Node<'d>>, ExtractError> {
    let value = xpath
        .xpath()
        .evaluate(context, root)
        .map_err(|e| ExtractError::evaluate("extract", name, Some(anyhow::anyhow!("{}", e))))?;

    match value {
        Value::Nodeset(nodes) => Ok(nodes.document_order()),
        other => Err(ExtractError::evaluate(
            "extract",
            name,
            Some(anyhow::anyhow!(
                "expression {} returned {:?}, expected a node-set",
                xpath.as_str(),
                other
            )),
        )),
    }
}

/// Returns the text carried by a node, if any.
fn node_text<'d>(node: &Node<'d>) -> Option<&'d str> {
    match node {
        Node::Element(element) => match element.children().into_iter().next() {
            Some(ChildOfElement::Text(text)) => Some(text.text()),
            _ => None,
        },
        Node::Text(text) => Some(text.text()),
        Node::Attribute(attr) => Some(attr.value()),
        Node::Comment(comment) => Some(comment.text()),
        Node::ProcessingInstruction(pi) => pi.value(),
        Node::Root(_) | Node::Namespace(_) => None,
    }
}
