//! Template set loading and substitution

use crate::config::PipelineConfig;
use crate::error::RenderError;
use crate::types::RenderContext;
use std::path::{Component, Path, PathBuf};
use tera::Tera;

/// What `render_into` produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderedTree {
    pub rendered: usize,
    pub copied: usize,
}

/// A directory of templates: text files substituted through Tera and binary
/// files (cover art and the like) copied verbatim
pub struct TemplateSet {
    root: PathBuf,
    directories: Vec<PathBuf>,
    binaries: Vec<PathBuf>,
    templates: Vec<PathBuf>,
    tera: Tera,
}

impl std::fmt::Debug for TemplateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateSet")
            .field("root", &self.root)
            .field("directories", &self.directories)
            .field("binaries", &self.binaries)
            .field("templates", &self.templates)
            .finish()
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RenderError + '_ {
    move |source| RenderError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Template name for a relative path, always `/`-separated
fn template_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl TemplateSet {
    /// Walk `config.template_dir` and parse every text template
    pub fn load(config: &PipelineConfig) -> Result<Self, RenderError> {
        let root = config.template_dir.clone();
        if !root.is_dir() {
            return Err(RenderError::MissingTemplateSet(root.display().to_string()));
        }

        let mut set = Self {
            root,
            directories: Vec::new(),
            binaries: Vec::new(),
            templates: Vec::new(),
            tera: Tera::default(),
        };
        set.walk(Path::new(""), config)?;

        let mut sources = Vec::with_capacity(set.templates.len());
        for relative in &set.templates {
            let path = set.root.join(relative);
            let content = std::fs::read_to_string(&path).map_err(io_error(&path))?;
            sources.push((template_name(relative), content));
        }

        // Content documents carry pre-rendered markup
        set.tera.autoescape_on(vec![]);
        set.tera
            .add_raw_templates(sources)
            .map_err(|source| RenderError::InvalidTemplate {
                name: set.root.display().to_string(),
                source,
            })?;

        tracing::info!(
            root = %set.root.display(),
            "Loaded {} templates, {} binary files",
            set.templates.len(),
            set.binaries.len()
        );
        Ok(set)
    }

    fn walk(&mut self, relative: &Path, config: &PipelineConfig) -> Result<(), RenderError> {
        let dir = self.root.join(relative);
        let mut children: Vec<_> = std::fs::read_dir(&dir)
            .map_err(io_error(&dir))?
            .collect::<Result<_, _>>()
            .map_err(io_error(&dir))?;
        children.sort_by_key(|e| e.file_name());

        for child in children {
            let child_relative = relative.join(child.file_name());
            let file_type = child.file_type().map_err(io_error(&dir))?;
            if file_type.is_dir() {
                self.directories.push(child_relative.clone());
                self.walk(&child_relative, config)?;
            } else if config.is_binary_template(&child_relative) {
                self.binaries.push(child_relative);
            } else {
                self.templates.push(child_relative);
            }
        }
        Ok(())
    }

    /// Relative paths of the text templates, in walk order
    pub fn templates(&self) -> &[PathBuf] {
        &self.templates
    }

    /// Relative paths of the files copied verbatim
    pub fn binaries(&self) -> &[PathBuf] {
        &self.binaries
    }

    /// Names the template set occupies directly inside `images_dir`, which
    /// downloaded images must not reuse
    pub fn reserved_names(&self, images_dir: &Path) -> Vec<String> {
        let images_dir: PathBuf = images_dir
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        let mut names: Vec<String> = self
            .directories
            .iter()
            .chain(&self.binaries)
            .chain(&self.templates)
            .filter_map(|relative| relative.strip_prefix(&images_dir).ok())
            .filter_map(|rest| rest.components().next())
            .map(|first| first.as_os_str().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Mirror the template set into `tree`, copying binaries and rendering
    /// every template with `context`. Any failure aborts.
    pub fn render_into(
        &self,
        tree: &Path,
        context: &RenderContext,
    ) -> Result<RenderedTree, RenderError> {
        tracing::info!("Creating EPUB in working tree {}", tree.display());
        for relative in &self.directories {
            let target = tree.join(relative);
            std::fs::create_dir_all(&target).map_err(io_error(&target))?;
        }

        let mut rendered = RenderedTree::default();
        for relative in &self.binaries {
            let source = self.root.join(relative);
            let target = tree.join(relative);
            tracing::info!("Copying {}", relative.display());
            std::fs::copy(&source, &target).map_err(io_error(&target))?;
            rendered.copied += 1;
        }

        let tera_context =
            tera::Context::from_serialize(context).map_err(|source| RenderError::Substitution {
                name: "context".to_string(),
                source,
            })?;

        for relative in &self.templates {
            let name = template_name(relative);
            tracing::info!("Processing template {}", name);
            let output = self
                .tera
                .render(&name, &tera_context)
                .map_err(|source| RenderError::Substitution {
                    name: name.clone(),
                    source,
                })?;
            let target = tree.join(relative);
            std::fs::write(&target, output).map_err(io_error(&target))?;
            rendered.rendered += 1;
        }

        Ok(rendered)
    }
}
