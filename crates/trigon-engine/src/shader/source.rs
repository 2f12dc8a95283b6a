use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::ShaderError;

/// Marker token that switches the accumulation target.
const MARKER: &str = "#shader";

/// Vertex and fragment source split out of one annotated shader file.
///
/// File format: a line containing `#shader vertex` or `#shader fragment` selects
/// which stage the following lines belong to. Every other line is copied to the
/// selected stage followed by `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderProgramSource {
    pub vertex: String,
    pub fragment: String,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Target {
    None,
    Vertex,
    Fragment,
}

/// Line-at-a-time splitter behind every `ShaderProgramSource` constructor.
struct SourceSplitter {
    target: Target,
    out: ShaderProgramSource,
    /// Lines seen before the first stage marker. They belong to no stage and are dropped.
    orphaned: usize,
}

impl SourceSplitter {
    fn new() -> Self {
        Self {
            target: Target::None,
            out: ShaderProgramSource::default(),
            orphaned: 0,
        }
    }

    fn push_line(&mut self, line: &str) {
        if line.contains(MARKER) {
            // A marker naming neither stage leaves the target as it was.
            if line.contains("vertex") {
                self.target = Target::Vertex;
            } else if line.contains("fragment") {
                self.target = Target::Fragment;
            } else {
                log::debug!("ignoring unknown shader marker: {line:?}");
            }
            return;
        }

        let buf = match self.target {
            Target::Vertex => &mut self.out.vertex,
            Target::Fragment => &mut self.out.fragment,
            Target::None => {
                self.orphaned += 1;
                return;
            }
        };
        buf.push_str(line);
        buf.push('\n');
    }

    fn finish(self) -> ShaderProgramSource {
        if self.orphaned > 0 {
            log::warn!(
                "dropped {} line(s) before the first `{MARKER}` marker",
                self.orphaned
            );
        }
        self.out
    }
}

impl ShaderProgramSource {
    /// Splits annotated shader text held in memory.
    pub fn parse(text: &str) -> Self {
        let mut splitter = SourceSplitter::new();
        for line in text.lines() {
            splitter.push_line(line);
        }
        splitter.finish()
    }

    /// Splits annotated shader text read line by line.
    pub fn from_reader<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut splitter = SourceSplitter::new();
        for line in reader.lines() {
            splitter.push_line(&line?);
        }
        Ok(splitter.finish())
    }

    /// Reads and splits a shader file.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ShaderError> {
        let path = path.as_ref();
        let io_err = |source| ShaderError::Io {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(io_err)?;
        Self::from_reader(BufReader::new(file)).map_err(io_err)
    }

    /// Like [`try_load`](Self::try_load), but a read failure is logged and yields an
    /// empty pair. Compiling the empty sources then fails with a clean diagnostic.
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path) {
            Ok(source) => source,
            Err(e) => {
                log::error!("{e}");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.fragment.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
#shader vertex
@vertex
fn vs_main() {}

#shader fragment
@fragment
fn fs_main() {}
";

    #[test]
    fn splits_stages_in_order() {
        let src = ShaderProgramSource::parse(WELL_FORMED);
        assert_eq!(src.vertex, "@vertex\nfn vs_main() {}\n\n");
        assert_eq!(src.fragment, "@fragment\nfn fs_main() {}\n");
    }

    #[test]
    fn reader_and_str_agree() {
        let from_reader = ShaderProgramSource::from_reader(WELL_FORMED.as_bytes()).unwrap();
        assert_eq!(from_reader, ShaderProgramSource::parse(WELL_FORMED));
    }

    #[test]
    fn lines_before_first_marker_are_dropped() {
        let src = ShaderProgramSource::parse("// preamble\nconst X: f32 = 1.0;\n#shader fragment\nbody\n");
        assert_eq!(src.vertex, "");
        assert_eq!(src.fragment, "body\n");
    }

    #[test]
    fn file_without_markers_is_empty() {
        let src = ShaderProgramSource::parse("a\nb\nc\n");
        assert!(src.is_empty());
    }

    #[test]
    fn unknown_marker_keeps_current_target() {
        let src = ShaderProgramSource::parse("#shader vertex\na\n#shader geometry\nb\n");
        assert_eq!(src.vertex, "a\nb\n");
        assert_eq!(src.fragment, "");
    }

    #[test]
    fn repeated_sections_append() {
        let src = ShaderProgramSource::parse(
            "#shader vertex\nv1\n#shader fragment\nf1\n#shader vertex\nv2\n",
        );
        assert_eq!(src.vertex, "v1\nv2\n");
        assert_eq!(src.fragment, "f1\n");
    }

    #[test]
    fn crlf_line_endings_are_normalized() {
        let src = ShaderProgramSource::parse("#shader vertex\r\nline\r\n");
        assert_eq!(src.vertex, "line\n");
    }

    #[test]
    fn missing_file_yields_empty_pair() {
        let path = std::env::temp_dir().join("trigon-no-such-file.shader");
        assert!(matches!(
            ShaderProgramSource::try_load(&path),
            Err(ShaderError::Io { .. })
        ));
        assert_eq!(ShaderProgramSource::load(&path), ShaderProgramSource::default());
    }

    #[test]
    fn loads_from_disk() {
        let path = std::env::temp_dir().join(format!("trigon-{}.shader", std::process::id()));
        std::fs::write(&path, WELL_FORMED).unwrap();

        let src = ShaderProgramSource::try_load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(src, ShaderProgramSource::parse(WELL_FORMED));
    }
}
