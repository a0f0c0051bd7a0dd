// Minimal element tree over xml-rs events; TMX documents are small.
use crate::error::MapError;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use xml::reader::{EventReader, XmlEvent};

#[derive(Debug, Default)]
pub(crate) struct XmlNode {
    pub name: String,
    attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: String,
}

impl XmlNode {
    pub fn parse(reader: impl Read, path: &Path) -> Result<XmlNode, MapError> {
        let mut stack: Vec<XmlNode> = Vec::new();
        let mut root = None;

        for event in EventReader::new(reader) {
            let event = event.map_err(|source| MapError::Xml {
                path: path.to_path_buf(),
                source,
            })?;
            match event {
                XmlEvent::StartElement {
                    name, attributes, ..
                } => stack.push(XmlNode {
                    name: name.local_name,
                    attrs: attributes
                        .into_iter()
                        .map(|a| (a.name.local_name, a.value))
                        .collect(),
                    ..XmlNode::default()
                }),
                XmlEvent::EndElement { .. } => {
                    if let Some(done) = stack.pop() {
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(done),
                            None => root = Some(done),
                        }
                    }
                }
                XmlEvent::Characters(s) | XmlEvent::CData(s) => {
                    if let Some(open) = stack.last_mut() {
                        open.text.push_str(&s);
                    }
                }
                _ => {}
            }
        }

        root.ok_or_else(|| MapError::MapData(format!("{} has no root element", path.display())))
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parses attribute `name`, using `default` when it is absent.
    pub fn attr_or<T: FromStr>(&self, name: &str, default: T) -> Result<T, MapError> {
        match self.attr(name) {
            None => Ok(default),
            Some(v) => self.parse_value(name, v),
        }
    }

    pub fn attr_opt<T: FromStr>(&self, name: &str) -> Result<Option<T>, MapError> {
        self.attr(name).map(|v| self.parse_value(name, v)).transpose()
    }

    fn parse_value<T: FromStr>(&self, name: &str, v: &str) -> Result<T, MapError> {
        v.trim().parse().map_err(|_| {
            MapError::MapData(format!(
                "<{}> attribute {}=\"{}\" is malformed",
                self.name, name, v
            ))
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_tree_with_text_and_attrs() {
        let doc = r#"<map width="2"><layer name="a"><data encoding="csv">1,2</data></layer><layer/></map>"#;
        let root = XmlNode::parse(doc.as_bytes(), Path::new("t.tmx")).unwrap();
        assert_eq!(root.name, "map");
        assert_eq!(root.attr_or("width", 0u32).unwrap(), 2);
        assert_eq!(root.attr_or("height", 5u32).unwrap(), 5);
        assert_eq!(root.children("layer").count(), 2);
        let data = root.child("layer").and_then(|l| l.child("data")).unwrap();
        assert_eq!(data.attr("encoding"), Some("csv"));
        assert_eq!(data.text, "1,2");
    }

    #[test]
    fn malformed_documents_and_attributes() {
        let err = XmlNode::parse("<map><layer></map>".as_bytes(), Path::new("t.tmx")).unwrap_err();
        assert!(matches!(err, MapError::Xml { .. }));

        let root = XmlNode::parse(r#"<map width="wide"/>"#.as_bytes(), Path::new("t.tmx")).unwrap();
        assert!(matches!(root.attr_or("width", 0u32), Err(MapError::MapData(_))));
    }
}
