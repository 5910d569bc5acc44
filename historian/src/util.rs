use std::path::PathBuf;

pub(crate) fn get_toml_config_file(dir: &str, config_file: &str) -> Option<PathBuf> {
    let mut path_buf = get_base_dir(dir)?;
    path_buf.push("config");
    path_buf.push(format!("{config_file}.toml"));
    Some(path_buf)
}

pub(crate) fn get_base_dir(dir: &str) -> Option<PathBuf> {
    let mut path_buf = PathBuf::new();
    if dir.starts_with("~/") {
        path_buf.push(dirs::home_dir()?);
        path_buf.push(dir.strip_prefix("~/")?);
    } else {
        path_buf.push(dir);
    }
    Some(path_buf)
}
