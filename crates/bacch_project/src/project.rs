//! The project: metadata, registered resources, and target resolution.

use bacch_config::Config;
use indexmap::IndexMap;
use serde::Serialize;

use crate::document::DocumentTree;
use crate::error::ProjectError;
use crate::resource::{Resource, Resources};
use crate::sections::SectionIndex;

/// How to treat declared resources whose directory does not exist.
///
/// Only resources without the source role can be dropped. A missing source
/// directory fails with [`ProjectError::MissingResourceDirectory`] under
/// every policy, including the default one, matching the build cache, which
/// refuses to scan a source directory it cannot list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    /// Drop missing non-source resources with a warning instead of failing.
    pub tolerate_missing: bool,
}

impl Default for ResourcePolicy {
    fn default() -> Self {
        Self {
            tolerate_missing: true,
        }
    }
}

impl ResourcePolicy {
    /// A policy that fails on any missing resource directory.
    pub fn strict() -> Self {
        Self {
            tolerate_missing: false,
        }
    }
}

/// A resolved build target: the owning resource and the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildSelector {
    /// Id of the resource that owns the target.
    pub resource: String,
    /// The requested target, `None` for the resource's default.
    pub target: Option<String>,
}

/// A loaded project.
#[derive(Debug)]
pub struct Project {
    title: String,
    slogan: Option<String>,
    default_build: Option<String>,
    resources: Resources,
    section_data: IndexMap<String, SectionIndex>,
}

impl Project {
    /// Builds a project from a parsed configuration.
    pub fn from_config(config: &Config, policy: ResourcePolicy) -> Result<Self, ProjectError> {
        let mut project = Self {
            title: String::new(),
            slogan: None,
            default_build: None,
            resources: Resources::new(),
            section_data: IndexMap::new(),
        };
        project.load_meta(config);
        project.load_resources(config, policy)?;
        project.load_section_data();
        log::debug!(
            "project '{}' ready with {} resources",
            project.title,
            project.resources.len()
        );
        Ok(project)
    }

    fn load_meta(&mut self, config: &Config) {
        self.title = config.meta.title.clone();
        self.slogan = config.meta.slogan.clone();
    }

    fn load_resources(
        &mut self,
        config: &Config,
        policy: ResourcePolicy,
    ) -> Result<(), ProjectError> {
        if config.resources.is_empty() {
            return Err(ProjectError::MissingResources);
        }

        for (name, spec) in &config.resources {
            if spec.role.is_source() {
                match &self.default_build {
                    None => self.default_build = Some(name.clone()),
                    Some(first) => {
                        log::warn!("source resource '{name}' ignored as default build; using '{first}'")
                    }
                }
            }

            if !spec.path.is_dir() {
                if spec.role.is_source() || !policy.tolerate_missing {
                    return Err(ProjectError::MissingResourceDirectory {
                        name: name.clone(),
                        path: spec.path.clone(),
                    });
                }
                log::warn!(
                    "dropping resource '{name}': {} is not a directory",
                    spec.path.display()
                );
                continue;
            }

            self.resources
                .insert(name.clone(), Resource::from_spec(spec)?);
        }
        Ok(())
    }

    fn load_section_data(&mut self) {
        self.section_data = self
            .resources
            .iter()
            .map(|(name, resource)| (name.clone(), resource.fetch_section_data()))
            .collect();
    }

    /// Finds the resource that owns `requested`.
    ///
    /// Resources are asked in registration order and the first that claims
    /// the target wins.
    pub fn resolve_build_target(
        &self,
        requested: Option<&str>,
    ) -> Result<BuildSelector, ProjectError> {
        if requested.is_none() && self.default_build.is_none() {
            return Err(ProjectError::NoBuildTarget);
        }

        self.resources
            .iter()
            .find(|(_, resource)| resource.find_target(requested))
            .map(|(key, _)| BuildSelector {
                resource: key.clone(),
                target: requested.map(str::to_string),
            })
            .ok_or_else(|| ProjectError::UnsupportedDefaultBuild {
                requested: requested.map(str::to_string),
            })
    }

    /// Compiles the target named by `selector`.
    pub fn compile(&self, selector: &BuildSelector) -> Result<DocumentTree, ProjectError> {
        let resource = self
            .resources
            .get(&selector.resource)
            .ok_or_else(|| ProjectError::UnknownResource(selector.resource.clone()))?;
        resource.compile(&self.resources, selector.target.as_deref())
    }

    /// Project title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Project slogan, if declared.
    pub fn slogan(&self) -> Option<&str> {
        self.slogan.as_deref()
    }

    /// Id of the first source resource, if any.
    pub fn default_build(&self) -> Option<&str> {
        self.default_build.as_deref()
    }

    /// Registered resources in registration order.
    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    /// Section index per registered resource.
    pub fn section_data(&self) -> &IndexMap<String, SectionIndex> {
        &self.section_data
    }
}
