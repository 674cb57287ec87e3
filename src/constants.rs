// src/constants.rs

/// The build file looked up in the current directory when `-f` is not given.
pub const DEFAULT_BUILD_FILENAME: &str = "anvil.toml";

/// The name of the per-user configuration directory (under the system config dir).
pub const CONFIG_DIR_NAME: &str = "anvil";

/// Per-user default properties, loaded into the inherited tier when present.
pub const USER_PROPERTIES_FILENAME: &str = "anvil.properties";

/// Property holding the tool version.
pub const VERSION_PROPERTY: &str = "anvil.version";

/// Property holding a unique id for the current build invocation.
pub const BUILD_ID_PROPERTY: &str = "anvil.build.id";

/// Property holding the project name.
pub const PROJECT_NAME_PROPERTY: &str = "anvil.project.name";

/// Property holding the project's base directory.
pub const BASEDIR_PROPERTY: &str = "basedir";

/// Separator between entries of a path list on this platform.
pub const PATH_LIST_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };
