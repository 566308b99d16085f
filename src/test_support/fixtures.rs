//! Pre-built formulas, environment snapshots, and source trees for tests.

use std::path::{Path, PathBuf};

use crate::core::{EnvironmentFacts, Formula, Tap};
use crate::toolchain::CompilerFamily;
use crate::util::fs::write_string;

/// The boost recipe, as shipped in the default tap.
pub const BOOST_TOML: &str = r#"[package]
name = "boost"
version = "1.51.0"
homepage = "http://www.boost.org"

[source]
url = "http://downloads.sourceforge.net/project/boost/boost/1.51.0/boost_1_51_0.tar.bz2"
sha1 = "52ef06895b97cc9981b8abf1997c375ca79f30c5"
strip_prefix = "boost_1_51_0"

[head]
url = "https://github.com/boostorg/boost.git"

[[options]]
name = "universal"
description = "Build a universal binary"

[[options]]
name = "cxx11"
description = "Build using C++11 mode"

[[options]]
name = "with-mpi"
description = "Enable MPI support"

[[options]]
name = "without-python"
description = "Build without Python"

[[options]]
name = "with-icu"
description = "Build regexp engine with icu support"

[[options]]
name = "with-log"
description = "Build with provisionally accepted logging library"

[[fails_with]]
compiler = "llvm-gcc"
build = 2335
cause = "Dropped arguments to functions when linking with boost"

[[dependencies]]
name = "icu4c"
when = "with-icu"

[[dependencies]]
name = "boost-log"
when = "with-log"
"#;

/// The historical logging add-on merged into the boost tree by `with-log`.
pub const BOOST_LOG_TOML: &str = r#"[package]
name = "boost-log"
version = "1.1.0"
homepage = "http://boost-log.sourceforge.net"

[source]
url = "http://downloads.sourceforge.net/project/boost-log/boost-log-1.1.zip"
md5 = "d42fc71d0ead0d413b997c0e678722ca"
strip_prefix = "boost-log-1.1"

[head]
url = "https://github.com/boostorg/log.git"
"#;

pub fn boost_formula() -> Formula {
    Formula::parse(BOOST_TOML, Path::new("boost.toml")).expect("boost fixture parses")
}

pub fn boost_log_formula() -> Formula {
    Formula::parse(BOOST_LOG_TOML, Path::new("boost-log.toml")).expect("boost-log fixture parses")
}

/// A plain clang environment: no ICU, no language-mode flag overrides.
pub fn env_facts() -> EnvironmentFacts {
    EnvironmentFacts {
        cxx: PathBuf::from("/usr/bin/clang++"),
        family: CompilerFamily::Clang,
        prefix: PathBuf::from("/opt/keg/cellar/boost/1.51.0"),
        libdir: PathBuf::from("/opt/keg/cellar/boost/1.51.0/lib"),
        jobs: 4,
        icu_prefix: None,
        cxxflags: Vec::new(),
        ldflags: Vec::new(),
        python: "python".to_string(),
    }
}

/// Write both shipped formulas into `root` and return it as a tap.
pub fn test_tap(root: &Path) -> Tap {
    write_string(&root.join("boost.toml"), BOOST_TOML).expect("write boost.toml");
    write_string(&root.join("boost-log.toml"), BOOST_LOG_TOML).expect("write boost-log.toml");
    Tap::new(root)
}

/// Lay out the skeleton of an unpacked boost tree: the two build-tool
/// entry points, the jam file the install-name patch edits, and a library
/// directory for the merge step to land in.
pub fn boost_source_tree(root: &Path) {
    write_string(&root.join("bootstrap.sh"), "#!/bin/sh\nexit 0\n").expect("write bootstrap.sh");
    write_string(&root.join("bjam"), "#!/bin/sh\nexit 0\n").expect("write bjam");
    write_string(
        &root.join("tools/build/v2/tools/darwin.jam"),
        concat!(
            "rule init ( version ? : command * : options * )\n",
            "{\n",
            "    flags darwin.compile OPTIONS : -install_name \"$(<[1]:B)$(<[1]:S)\" ;\n",
            "}\n"
        ),
    )
    .expect("write darwin.jam");
    write_string(
        &root.join("boost/version.hpp"),
        "#define BOOST_VERSION 105100\n",
    )
    .expect("write version.hpp");
    write_string(&root.join("libs/regex/src/regex.cpp"), "// regex\n").expect("write regex.cpp");
}

/// Lay out the skeleton of an unpacked boost-log tree: the headers and
/// sources the merge copies, including the file carrying the deprecated
/// platform API call.
pub fn boost_log_source_tree(root: &Path) {
    write_string(
        &root.join("boost/log/core/core.hpp"),
        "// boost.log core\n",
    )
    .expect("write core.hpp");
    write_string(
        &root.join("libs/log/src/text_file_backend.cpp"),
        concat!(
            "#include <boost/system/error_code.hpp>\n",
            "code = boost::system::posix::get_generic_category();\n",
            "ec = error_code(err, get_generic_category());\n"
        ),
    )
    .expect("write text_file_backend.cpp");
    write_string(&root.join("libs/log/src/core.cpp"), "// log core\n").expect("write core.cpp");
}

/// Write an executable that prints a fixed `--version` line, standing in
/// for a real C++ compiler in pipeline tests.
#[cfg(unix)]
pub fn fake_compiler(dir: &Path, version_line: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-cxx");
    write_string(&path, &format!("#!/bin/sh\necho \"{version_line}\"\n"))
        .expect("write fake compiler");
    let mut perms = std::fs::metadata(&path)
        .expect("stat fake compiler")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod fake compiler");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::hash::DigestKind;

    #[test]
    fn test_fixture_formulas_parse() {
        let boost = boost_formula();
        assert_eq!(boost.package.name, "boost");
        assert_eq!(boost.checksum().kind, DigestKind::Sha1);
        assert!(boost.has_option("with-log"));

        let log = boost_log_formula();
        assert_eq!(log.checksum().kind, DigestKind::Md5);
        assert_eq!(log.source.strip_prefix.as_deref(), Some("boost-log-1.1"));
    }

    #[test]
    fn test_tap_lists_both_formulas() {
        let tmp = tempfile::tempdir().unwrap();
        let tap = test_tap(tmp.path());
        assert_eq!(tap.list().unwrap(), vec!["boost", "boost-log"]);
    }
}
