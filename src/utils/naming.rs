use uuid::Uuid;

/// Extension of the final path segment of `filename`, dot included.
///
/// `photo.jpg` → `.jpg`, `a.tar.gz` → `.gz`, `.bashrc` → `""`, `README` → `""`.
pub fn extension_of(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);

    if base == ".." {
        return "";
    }

    match base.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &base[idx..],
    }
}

/// Fresh identifier used when the client does not name an upload or group
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Key of a single upload: the requested name (or the id the intake assigned)
/// followed by the original file's extension.
pub fn single_object_key(
    requested: Option<&str>,
    assigned_id: &str,
    original_filename: &str,
) -> String {
    let base = requested.unwrap_or(assigned_id);
    format!("{}{}", base, extension_of(original_filename))
}

/// Name of the `index`-th (1-based) file inside a group.
///
/// A requested name is used verbatim; otherwise it is `{index}{ext}`.
pub fn member_name(index: usize, requested: Option<&str>, original_filename: &str) -> String {
    match requested {
        Some(name) => name.to_string(),
        None => format!("{}{}", index, extension_of(original_filename)),
    }
}

pub fn group_object_key(group_id: &str, member: &str) -> String {
    format!("{}/{}", group_id, member)
}

/// Prefix under which all members of a group are listed
pub fn group_prefix(group_id: &str) -> String {
    format!("{}/", group_id)
}

/// Directory markers end with `/` and are not files
pub fn is_directory_marker(key: &str) -> bool {
    key.ends_with('/')
}

/// Turns a client-chosen name into a single safe path component for the
/// staging directory. Object keys keep the original name.
pub fn local_component(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control() || c == '/' || c == '\\' || c == ':' {
                '_'
            } else {
                c
            }
        })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => sanitized,
    }
}
