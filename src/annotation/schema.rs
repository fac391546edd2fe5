//! The annotation layouts and their field mapping.

use roxmltree::{Document, Node};
use serde::Serialize;

const PLATE_ATTRIBUTE: &str = "plate number";

/// Annotation layout, chosen by whether any `<image>` element exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationSchema {
    /// `<image name>` / `<box label>` or `<box><attribute name="plate number">`.
    PerImage,
    /// `<annotation>` / `<filename>` + `<object><name>`.
    Flat,
}

impl AnnotationSchema {
    /// Probe a document for its layout.
    #[must_use]
    pub fn detect(doc: &Document<'_>) -> Self {
        if doc.descendants().any(|n| n.has_tag_name("image")) {
            Self::PerImage
        } else {
            Self::Flat
        }
    }

    /// Short name for logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::PerImage => "per-image",
            Self::Flat => "flat",
        }
    }

    /// Extract `(bare filename, plate)` pairs in document order.
    ///
    /// Entries missing either field are skipped. Only the first box or
    /// object of an image is read.
    pub fn entries(self, doc: &Document<'_>) -> Vec<(String, String)> {
        match self {
            Self::PerImage => doc
                .descendants()
                .filter(|n| n.has_tag_name("image"))
                .filter_map(per_image_entry)
                .collect(),
            Self::Flat => doc
                .descendants()
                .filter(|n| n.has_tag_name("annotation"))
                .filter_map(flat_entry)
                .collect(),
        }
    }
}

fn per_image_entry(image: Node<'_, '_>) -> Option<(String, String)> {
    let filename = base_name(image.attribute("name")?)?;
    let bbox = image.descendants().find(|n| n.has_tag_name("box"))?;

    // A dedicated plate-number attribute beats the box label, which in
    // CVAT exports holds the class name ("plate") rather than the text.
    let plate = match bbox
        .children()
        .find(|n| n.has_tag_name("attribute") && n.attribute("name") == Some(PLATE_ATTRIBUTE))
    {
        Some(attr) => non_blank(&text_content(attr))?,
        None => non_blank(bbox.attribute("label")?)?,
    };

    Some((filename, plate))
}

fn flat_entry(annotation: Node<'_, '_>) -> Option<(String, String)> {
    let filename = child_text(annotation, "filename").and_then(|f| base_name(&f))?;
    let object = annotation.children().find(|n| n.has_tag_name("object"))?;
    let plate = child_text(object, "name")?;
    Some((filename, plate))
}

fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    let child = node.children().find(|n| n.has_tag_name(tag))?;
    non_blank(&text_content(child))
}

/// Concatenated text of all descendant text nodes.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Strip any directory prefix, accepting both `/` and `\` separators.
fn base_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    non_blank(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("a/b/c.jpg").as_deref(), Some("c.jpg"));
        assert_eq!(base_name("C:\\data\\c.jpg").as_deref(), Some("c.jpg"));
        assert_eq!(base_name("c.jpg").as_deref(), Some("c.jpg"));
        assert_eq!(base_name("dir/"), None);
        assert_eq!(base_name(""), None);
    }

    #[test]
    fn test_detect() {
        let doc = Document::parse("<annotations><image name='a.jpg'/></annotations>").unwrap();
        assert_eq!(AnnotationSchema::detect(&doc), AnnotationSchema::PerImage);

        let doc = Document::parse("<root><annotation/></root>").unwrap();
        assert_eq!(AnnotationSchema::detect(&doc), AnnotationSchema::Flat);
    }

    #[test]
    fn test_box_label_fallback() {
        let doc = Document::parse(
            "<annotations><image name='x.jpg'><box label=' SK 777 '/></image></annotations>",
        )
        .unwrap();
        let entries = AnnotationSchema::PerImage.entries(&doc);
        assert_eq!(entries, vec![("x.jpg".to_string(), "SK 777".to_string())]);
    }

    #[test]
    fn test_plate_attribute_beats_label() {
        let doc = Document::parse(
            "<annotations>\
               <image name='x.jpg'><box label='plate'>\
                 <attribute name='plate number'>WE 12345</attribute>\
               </box></image>\
               <image name='y.jpg'><box label='KR 1'>\
                 <attribute name='plate number'>  </attribute>\
               </box></image>\
             </annotations>",
        )
        .unwrap();
        let entries = AnnotationSchema::PerImage.entries(&doc);
        assert_eq!(entries, vec![("x.jpg".to_string(), "WE 12345".to_string())]);
    }
}
