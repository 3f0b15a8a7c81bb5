//! Partitioning a document's top-level children around `<head>` and `<body>`.

use html::{Node, ParseError, to_html};

/// The root element's children in five ordered slices. Text regions hold
/// the serialized siblings joined with `"\n"`; `head`/`body` are `None`
/// when the element is absent, which is not the same as an empty element.
#[derive(Debug, Default)]
pub struct RegionSet {
    pub pre_head: String,
    pub head: Option<Node>,
    pub pre_body: String,
    pub body: Option<Node>,
    pub post_body: String,
}

impl RegionSet {
    /// Markup of every region, in document order.
    pub fn to_markup(&self) -> String {
        let parts = [
            self.pre_head.clone(),
            self.head.as_ref().map(to_html).unwrap_or_default(),
            self.pre_body.clone(),
            self.body.as_ref().map(to_html).unwrap_or_default(),
            self.post_body.clone(),
        ];
        parts
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    PreHead,
    PreBody,
    PostBody,
}

/// Moves the root element's children out into a [`RegionSet`], leaving the
/// root empty. Siblings before the first head or body go to `pre_head`,
/// siblings between head and body to `pre_body`, and everything after body
/// to `post_body`, whatever its tag.
pub fn split_regions(document: &mut Node) -> Result<RegionSet, ParseError> {
    let children = document
        .root_element_mut()
        .and_then(Node::children_mut)
        .map(std::mem::take)
        .ok_or(ParseError::MissingRoot)?;

    let mut regions = RegionSet::default();
    let mut pre_head = Vec::new();
    let mut pre_body = Vec::new();
    let mut post_body = Vec::new();
    let mut slot = Slot::PreHead;
    for child in children {
        match slot {
            Slot::PreHead if child.is_element_named("head") => {
                regions.head = Some(child);
                slot = Slot::PreBody;
            }
            Slot::PreHead | Slot::PreBody if child.is_element_named("body") => {
                regions.body = Some(child);
                slot = Slot::PostBody;
            }
            Slot::PreHead => pre_head.push(to_html(&child)),
            Slot::PreBody => pre_body.push(to_html(&child)),
            Slot::PostBody => post_body.push(to_html(&child)),
        }
    }
    regions.pre_head = pre_head.join("\n");
    regions.pre_body = pre_body.join("\n");
    regions.post_body = post_body.join("\n");

    log::debug!(
        target: "differs.regions",
        "regions: pre_head {}B, head {}, pre_body {}B, body {}, post_body {}B",
        regions.pre_head.len(),
        if regions.head.is_some() { "present" } else { "absent" },
        regions.pre_body.len(),
        if regions.body.is_some() { "present" } else { "absent" },
        regions.post_body.len()
    );
    Ok(regions)
}
