use crate::error::{ImportError, ImportResult};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

/// 解析后的 XML 元素 (命名空间已展开)
#[derive(Debug, Default)]
pub(crate) struct Element {
    pub namespace: Option<String>,
    pub name: String, // 本地名
    pub attributes: Vec<(String, String)>,
    pub text: String, // 第一个子元素之前的文本
    pub children: Vec<Element>,
}

impl Element {
    pub fn is(&self, ns: &str, local: &str) -> bool {
        self.name == local && self.namespace.as_deref() == Some(ns)
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 第一个匹配的直接子元素
    pub fn child(&self, ns: &str, local: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(ns, local))
    }

    /// 直接子元素的文本，缺失时返回空串
    pub fn child_text(&self, ns: &str, local: &str) -> &str {
        self.child(ns, local).map(|c| c.text.as_str()).unwrap_or("")
    }

    /// 按文档顺序遍历所有后代 (不含自身)
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    /// 第一个匹配的后代
    pub fn find(&self, ns: &str, local: &str) -> Option<&Element> {
        self.descendants().find(|e| e.is(ns, local))
    }
}

pub(crate) struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let el = self.stack.pop()?;
        self.stack.extend(el.children.iter().rev());
        Some(el)
    }
}

/// 把整个文档读成一棵树，任何不合法的 XML 都返回 Parse 错误
///
/// 文本按 XML 声明中的 encoding 解码 (默认 UTF-8)。
pub(crate) fn parse(xml: &[u8]) -> ImportResult<Element> {
    let mut reader = NsReader::from_reader(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let decoder = reader.decoder();
        let (ns, event) = reader.read_resolved_event()?;
        let namespace = match ns {
            ResolveResult::Bound(ns) => Some(decode(decoder, ns.as_ref())?),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => return Err(unbound_prefix(&prefix)),
        };

        match event {
            Event::Start(ref e) => {
                ensure_single_root(&root)?;
                stack.push(open(&reader, e, namespace)?);
            }
            Event::Empty(ref e) => {
                ensure_single_root(&root)?;
                let el = open(&reader, e, namespace)?;
                close(el, &mut stack, &mut root);
            }
            Event::End(_) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| ImportError::Parse("unexpected closing tag".into()))?;
                close(el, &mut stack, &mut root);
            }
            Event::Text(ref t) => {
                let text = t.unescape()?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(ref c) => {
                let text = c.decode().map_err(quick_xml::Error::from)?;
                push_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ImportError::Parse(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ImportError::Parse("no root element".into()))
}

fn open(
    reader: &NsReader<&[u8]>,
    e: &BytesStart<'_>,
    namespace: Option<String>,
) -> ImportResult<Element> {
    let decoder = reader.decoder();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        // 带前缀的属性名同样必须有命名空间声明
        if let (ResolveResult::Unknown(prefix), _) = reader.resolve_attribute(attr.key) {
            return Err(unbound_prefix(&prefix));
        }
        let key = decode(decoder, attr.key.as_ref())?;
        let value = attr.decode_and_unescape_value(decoder)?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        namespace,
        name: decode(decoder, e.local_name().as_ref())?,
        attributes,
        ..Default::default()
    })
}

fn close(el: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(el),
        None => *root = Some(el),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> ImportResult<()> {
    match stack.last_mut() {
        Some(el) => {
            if el.children.is_empty() {
                el.text.push_str(text);
            }
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(ImportError::Parse("text outside of the root element".into())),
    }
}

fn ensure_single_root(root: &Option<Element>) -> ImportResult<()> {
    match root {
        Some(_) => Err(ImportError::Parse("content after the root element".into())),
        None => Ok(()),
    }
}

fn unbound_prefix(prefix: &[u8]) -> ImportError {
    ImportError::Parse(format!(
        "unbound namespace prefix {:?}",
        String::from_utf8_lossy(prefix)
    ))
}

fn decode(decoder: Decoder, bytes: &[u8]) -> ImportResult<String> {
    decoder
        .decode(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| ImportError::Parse(format!("cannot decode {:?}: {e}", String::from_utf8_lossy(bytes))))
}
