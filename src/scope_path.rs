use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single DAV path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub fn normalize(path: &str) -> String {
    let mut normalized = path.replace('\\', "/");
    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }
    while normalized.ends_with('/') && normalized.len() > 1 {
        normalized.pop();
    }
    if !normalized.starts_with('/') {
        normalized.insert(0, '/');
    }
    normalized
}

pub fn join(base: &str, child: &str) -> String {
    normalize(&format!("{}/{}", base, child.trim_start_matches('/')))
}

pub fn basename(path: &str) -> String {
    normalize(path)
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .to_string()
}

pub fn is_within_scope(path: &str, root: &str) -> bool {
    let path = normalize(path);
    let root = normalize(root);

    if path == root || root == "/" {
        return true;
    }

    path.starts_with(&(root + "/"))
}

/// Maps a server href onto a path relative to `root`, decoding escapes.
/// Returns `None` when the href lies outside `root`.
pub fn relative_to(href: &str, root: &str) -> Option<String> {
    let decoded = decode(href);
    let path = normalize(&decoded);
    let root = normalize(root);
    if !is_within_scope(&path, &root) {
        return None;
    }
    if root == "/" {
        return Some(path);
    }
    Some(normalize(&path[root.len()..]))
}

pub fn decode(value: &str) -> String {
    percent_decode_str(value).decode_utf8_lossy().into_owned()
}

pub fn encode(path: &str) -> String {
    let encoded: Vec<String> = path
        .split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect();
    encoded.join("/")
}
