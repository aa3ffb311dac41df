//! Catalog-level data read with lopdf: page mode, page labels, forms,
//! embedded files, named destinations, XMP title, trailer ID.

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::document::Attachment;
use crate::page_labels::{LabelRange, LabelStyle, MAX_LABEL_START};
use crate::view_state::PageModeHint;

/// Number and name trees deeper than this are treated as corrupt
const MAX_TREE_DEPTH: usize = 32;

const DUBLIN_CORE_NS: &str = "http://purl.org/dc/elements/1.1/";

#[derive(Debug, Default)]
pub struct CatalogInfo {
    pub page_mode: PageModeHint,
    pub label_ranges: Option<Vec<LabelRange>>,
    pub is_acro_form_present: bool,
    pub attachments: Vec<Attachment>,
    /// Named destination to 1-based page
    pub destinations: HashMap<String, u32>,
    pub trailer_id: Option<Vec<u8>>,
    pub is_linearized: bool,
    /// `dc:title` from the catalog XMP metadata stream
    pub metadata_title: Option<String>,
}

impl CatalogInfo {
    pub fn read(bytes: &[u8]) -> Result<Self, lopdf::Error> {
        let doc = Document::load_mem(bytes)?;
        let catalog = root_dictionary(&doc)?;
        let page_numbers: HashMap<ObjectId, u32> = doc
            .get_pages()
            .into_iter()
            .map(|(number, id)| (id, number))
            .collect();

        let page_mode = catalog
            .get(b"PageMode")
            .and_then(Object::as_name)
            .map(|name| PageModeHint::from_name(&String::from_utf8_lossy(name)))
            .unwrap_or_default();

        let label_ranges = catalog
            .get(b"PageLabels")
            .ok()
            .and_then(|tree| resolve(&doc, tree).as_dict().ok())
            .map(|tree| {
                let mut ranges = Vec::new();
                collect_number_tree(&doc, tree, 0, &mut |index, value| {
                    if let Some(range) = label_range(&doc, index, value) {
                        ranges.push(range);
                    }
                });
                ranges
            });

        let mut destinations = HashMap::new();
        if let Ok(dests) = catalog.get(b"Dests") {
            if let Ok(dests) = resolve(&doc, dests).as_dict() {
                for (name, value) in dests.iter() {
                    if let Some(page) = destination_page(&doc, value, &page_numbers) {
                        destinations.insert(String::from_utf8_lossy(name).into_owned(), page);
                    }
                }
            }
        }

        let names = catalog
            .get(b"Names")
            .ok()
            .and_then(|names| resolve(&doc, names).as_dict().ok());
        let mut attachments = Vec::new();
        if let Some(names) = names {
            if let Some(tree) = name_tree_root(&doc, names, b"Dests") {
                collect_name_tree(&doc, tree, 0, &mut |name, value| {
                    if let Some(page) = destination_page(&doc, value, &page_numbers) {
                        destinations.insert(decode_text(name), page);
                    }
                });
            }
            if let Some(tree) = name_tree_root(&doc, names, b"EmbeddedFiles") {
                collect_name_tree(&doc, tree, 0, &mut |name, value| {
                    attachments.push(attachment(&doc, name, value));
                });
            }
        }

        let is_acro_form_present = catalog
            .get(b"AcroForm")
            .ok()
            .and_then(|form| resolve(&doc, form).as_dict().ok())
            .is_some_and(|form| {
                let has_fields = form
                    .get(b"Fields")
                    .ok()
                    .and_then(|fields| resolve(&doc, fields).as_array().ok())
                    .is_some_and(|fields| !fields.is_empty());
                has_fields || form.has(b"XFA")
            });

        let trailer_id = doc
            .trailer
            .get(b"ID")
            .ok()
            .and_then(|id| resolve(&doc, id).as_array().ok())
            .and_then(|ids| ids.first())
            .and_then(|first| match first {
                Object::String(bytes, _) if !bytes.is_empty() => Some(bytes.clone()),
                _ => None,
            });

        let is_linearized = doc
            .objects
            .values()
            .any(|object| object.as_dict().is_ok_and(|dict| dict.has(b"Linearized")));

        let metadata_title = catalog
            .get(b"Metadata")
            .ok()
            .and_then(|metadata| match resolve(&doc, metadata) {
                Object::Stream(stream) => Some(
                    stream
                        .decompressed_content()
                        .unwrap_or_else(|_| stream.content.clone()),
                ),
                _ => None,
            })
            .and_then(|xmp| xmp_title(&String::from_utf8_lossy(&xmp)));

        Ok(Self {
            page_mode,
            label_ranges,
            is_acro_form_present,
            attachments,
            destinations,
            trailer_id,
            is_linearized,
            metadata_title,
        })
    }
}

fn root_dictionary(doc: &Document) -> Result<&Dictionary, lopdf::Error> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    doc.get_dictionary(root_id)
}

/// Follow a reference, or return the object itself
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn collect_number_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    visit: &mut dyn FnMut(usize, &Object),
) {
    if depth > MAX_TREE_DEPTH {
        log::warn!("PageLabels tree too deep, ignoring the rest");
        return;
    }
    if let Ok(nums) = node.get(b"Nums").and_then(Object::as_array) {
        for pair in nums.chunks(2) {
            if let [key, value] = pair {
                match resolve(doc, key).as_i64() {
                    Ok(index) if index >= 0 => visit(index as usize, resolve(doc, value)),
                    _ => log::debug!("Skipping malformed page label key {key:?}"),
                }
            }
        }
    }
    if let Ok(kids) = node.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            if let Ok(kid) = resolve(doc, kid).as_dict() {
                collect_number_tree(doc, kid, depth + 1, visit);
            }
        }
    }
}

fn label_range(doc: &Document, start_index: usize, value: &Object) -> Option<LabelRange> {
    let dict = value.as_dict().ok()?;
    let style = dict
        .get(b"S")
        .and_then(Object::as_name)
        .ok()
        .and_then(|name| {
            let name = String::from_utf8_lossy(name);
            let style = LabelStyle::from_name(&name);
            if style.is_none() {
                log::warn!("Unknown page label style {name:?}");
            }
            style
        });
    let prefix = dict
        .get(b"P")
        .ok()
        .and_then(|p| match resolve(doc, p) {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        })
        .unwrap_or_default();
    let first_number = dict
        .get(b"St")
        .ok()
        .and_then(|st| resolve(doc, st).as_i64().ok())
        .filter(|st| *st >= 1)
        .map_or(1, |st| {
            if st > i64::from(MAX_LABEL_START) {
                log::warn!("Page label start {st} out of range, using {MAX_LABEL_START}");
                MAX_LABEL_START
            } else {
                st as u32
            }
        });
    Some(LabelRange {
        start_index,
        style,
        prefix,
        first_number,
    })
}

fn name_tree_root<'a>(doc: &'a Document, names: &'a Dictionary, key: &[u8]) -> Option<&'a Dictionary> {
    names
        .get(key)
        .ok()
        .and_then(|tree| resolve(doc, tree).as_dict().ok())
}

fn collect_name_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    visit: &mut dyn FnMut(&[u8], &Object),
) {
    if depth > MAX_TREE_DEPTH {
        log::warn!("Name tree too deep, ignoring the rest");
        return;
    }
    if let Ok(names) = node.get(b"Names").and_then(Object::as_array) {
        for pair in names.chunks(2) {
            if let [Object::String(name, _), value] = pair {
                visit(name, resolve(doc, value));
            }
        }
    }
    if let Ok(kids) = node.get(b"Kids").and_then(Object::as_array) {
        for kid in kids {
            if let Ok(kid) = resolve(doc, kid).as_dict() {
                collect_name_tree(doc, kid, depth + 1, visit);
            }
        }
    }
}

/// Page of an explicit destination: `[page /XYZ ...]` or `<< /D [...] >>`
fn destination_page(
    doc: &Document,
    value: &Object,
    page_numbers: &HashMap<ObjectId, u32>,
) -> Option<u32> {
    let value = resolve(doc, value);
    let array = match value {
        Object::Array(array) => array,
        Object::Dictionary(dict) => resolve(doc, dict.get(b"D").ok()?).as_array().ok()?,
        _ => return None,
    };
    match array.first()? {
        Object::Reference(id) => page_numbers.get(id).copied(),
        // Remote-style destinations use a 0-based page index
        Object::Integer(index) => u32::try_from(*index).ok().and_then(|i| i.checked_add(1)),
        _ => None,
    }
}

fn attachment(doc: &Document, name: &[u8], filespec: &Object) -> Attachment {
    let dict = filespec.as_dict().ok();
    let filename = dict
        .and_then(|d| d.get(b"UF").or_else(|_| d.get(b"F")).ok())
        .and_then(|f| match resolve(doc, f) {
            Object::String(bytes, _) => Some(decode_text(bytes)),
            _ => None,
        })
        .unwrap_or_else(|| decode_text(name));
    let size = dict
        .and_then(|d| d.get(b"EF").ok())
        .and_then(|ef| resolve(doc, ef).as_dict().ok())
        .and_then(|ef| ef.get(b"F").ok())
        .and_then(|stream| match resolve(doc, stream) {
            Object::Stream(stream) => Some(
                stream
                    .dict
                    .get(b"Params")
                    .ok()
                    .and_then(|p| resolve(doc, p).as_dict().ok())
                    .and_then(|p| p.get(b"Size").ok())
                    .and_then(|s| s.as_i64().ok())
                    .and_then(|s| usize::try_from(s).ok())
                    .unwrap_or(stream.content.len()),
            ),
            _ => None,
        });
    Attachment { filename, size }
}

/// Title from an XMP packet: the first `rdf:li` under `dc:title`, or the
/// element text when it has no alternatives.
fn xmp_title(xmp: &str) -> Option<String> {
    let doc = match roxmltree::Document::parse(xmp.trim_matches(char::from(0))) {
        Ok(doc) => doc,
        Err(e) => {
            log::debug!("Ignoring unparsable XMP metadata: {e}");
            return None;
        }
    };
    let title = doc.descendants().find(|node| {
        node.tag_name().name() == "title" && node.tag_name().namespace() == Some(DUBLIN_CORE_NS)
    })?;
    let text = title
        .descendants()
        .find(|node| node.tag_name().name() == "li")
        .and_then(|li| li.text())
        .or_else(|| title.text())?
        .trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// PDF text string: UTF-16BE with BOM, else byte-per-char.
pub fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
