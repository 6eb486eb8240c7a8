//! Technology stack detection from a top-level file listing and a manifest.
//!
//! Each category is an ordered rule list; the first matching rule supplies
//! the label, so a repository that depends on both `next` and `react` is
//! reported as Next.js.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;

/// Rendered for categories with no signal
pub const NOT_DETECTED: &str = "not detected";

/// Detected technologies, one optional label per category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackInfo {
    /// Frontend framework or library
    pub frontend: Option<String>,
    /// Backend language/runtime
    pub backend: Option<String>,
    /// Backend web framework
    pub framework: Option<String>,
    /// Database or ORM
    pub database: Option<String>,
    /// Deployment target
    pub deployment: Option<String>,
    /// Languages inferred from file extensions, sorted
    pub languages: Vec<String>,
}

impl StackInfo {
    /// Labels that were detected, in category order
    pub fn detected_labels(&self) -> Vec<&str> {
        [&self.frontend, &self.backend, &self.framework, &self.database, &self.deployment]
            .into_iter()
            .filter_map(|label| label.as_deref())
            .collect()
    }
}

impl fmt::Display for StackInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |label: &Option<String>| label.clone().unwrap_or_else(|| NOT_DETECTED.to_string());
        writeln!(f, "Frontend: {}", show(&self.frontend))?;
        writeln!(f, "Backend: {}", show(&self.backend))?;
        writeln!(f, "Framework: {}", show(&self.framework))?;
        writeln!(f, "Database: {}", show(&self.database))?;
        writeln!(f, "Deployment: {}", show(&self.deployment))?;
        if self.languages.is_empty() {
            write!(f, "Languages: {}", NOT_DETECTED)
        } else {
            write!(f, "Languages: {}", self.languages.join(", "))
        }
    }
}

/// Signals a rule can test
enum Signal {
    /// A dependency name declared in the manifest
    Dependency(&'static str),
    /// A top-level file name ending with this suffix (case-insensitive)
    Extension(&'static str),
    /// A top-level entry with exactly this name (case-insensitive)
    File(&'static str),
}

struct Rule {
    label: &'static str,
    signals: &'static [Signal],
}

use Signal::{Dependency as Dep, Extension as Ext, File};

const FRONTEND_RULES: &[Rule] = &[
    Rule { label: "Next.js", signals: &[Dep("next"), File("next.config.js"), File("next.config.mjs"), File("next.config.ts")] },
    Rule { label: "Nuxt", signals: &[Dep("nuxt"), File("nuxt.config.ts"), File("nuxt.config.js")] },
    Rule { label: "React", signals: &[Dep("react"), Ext(".jsx"), Ext(".tsx")] },
    Rule { label: "Vue", signals: &[Dep("vue"), Ext(".vue")] },
    Rule { label: "Svelte", signals: &[Dep("svelte"), Ext(".svelte")] },
    Rule { label: "Angular", signals: &[Dep("@angular/core"), File("angular.json")] },
    Rule { label: "HTML/CSS", signals: &[Ext(".html"), Ext(".css")] },
];

const BACKEND_RULES: &[Rule] = &[
    Rule { label: "Python", signals: &[Ext(".py"), File("requirements.txt"), File("pyproject.toml")] },
    Rule { label: "Node.js", signals: &[Dep("express"), Dep("fastify"), Dep("koa"), Dep("@nestjs/core"), File("server.js")] },
    Rule { label: "Go", signals: &[Ext(".go"), File("go.mod")] },
    Rule { label: "Rust", signals: &[Ext(".rs"), File("cargo.toml")] },
    Rule { label: "Java", signals: &[Ext(".java"), File("pom.xml"), File("build.gradle")] },
    Rule { label: "Ruby", signals: &[Ext(".rb"), File("gemfile")] },
    Rule { label: "PHP", signals: &[Ext(".php"), File("composer.json")] },
];

const FRAMEWORK_RULES: &[Rule] = &[
    Rule { label: "FastAPI", signals: &[Dep("fastapi")] },
    Rule { label: "Django", signals: &[Dep("django"), File("manage.py")] },
    Rule { label: "Flask", signals: &[Dep("flask")] },
    Rule { label: "NestJS", signals: &[Dep("@nestjs/core")] },
    Rule { label: "Express", signals: &[Dep("express")] },
    Rule { label: "Fastify", signals: &[Dep("fastify")] },
    Rule { label: "Koa", signals: &[Dep("koa")] },
];

const DATABASE_RULES: &[Rule] = &[
    Rule { label: "Prisma", signals: &[Dep("prisma"), Dep("@prisma/client")] },
    Rule { label: "MongoDB", signals: &[Dep("mongodb"), Dep("mongoose"), Dep("pymongo"), Dep("motor")] },
    Rule { label: "PostgreSQL", signals: &[Dep("pg"), Dep("postgres"), Dep("psycopg2"), Dep("psycopg2-binary"), Dep("psycopg"), Dep("asyncpg")] },
    Rule { label: "MySQL", signals: &[Dep("mysql"), Dep("mysql2"), Dep("pymysql"), Dep("mysqlclient")] },
    Rule { label: "SQLite", signals: &[Dep("sqlite3"), Dep("better-sqlite3"), Ext(".db"), Ext(".sqlite")] },
    Rule { label: "Redis", signals: &[Dep("redis"), Dep("ioredis")] },
    Rule { label: "Firebase", signals: &[Dep("firebase"), Dep("firebase-admin"), File("firebase.json")] },
    Rule { label: "Supabase", signals: &[Dep("@supabase/supabase-js"), Dep("supabase")] },
    Rule { label: "SQLAlchemy", signals: &[Dep("sqlalchemy")] },
];

const DEPLOYMENT_RULES: &[Rule] = &[
    Rule { label: "Docker", signals: &[File("dockerfile"), File("docker-compose.yml"), File("docker-compose.yaml"), File("compose.yaml")] },
    Rule { label: "Vercel", signals: &[File("vercel.json"), File(".vercel")] },
    Rule { label: "Netlify", signals: &[File("netlify.toml")] },
    Rule { label: "Heroku", signals: &[File("procfile"), File("app.json")] },
    Rule { label: "Fly.io", signals: &[File("fly.toml")] },
    Rule { label: "Render", signals: &[File("render.yaml")] },
];

const LANGUAGE_EXTENSIONS: &[(&str, &str)] = &[
    (".py", "Python"),
    (".js", "JavaScript"),
    (".mjs", "JavaScript"),
    (".jsx", "JavaScript"),
    (".ts", "TypeScript"),
    (".tsx", "TypeScript"),
    (".go", "Go"),
    (".rs", "Rust"),
    (".java", "Java"),
    (".kt", "Kotlin"),
    (".rb", "Ruby"),
    (".php", "PHP"),
    (".cs", "C#"),
    (".cpp", "C++"),
    (".c", "C"),
    (".swift", "Swift"),
    (".dart", "Dart"),
    (".html", "HTML"),
    (".scss", "SCSS"),
    (".css", "CSS"),
    (".vue", "Vue"),
    (".svelte", "Svelte"),
];

/// Normalised detection inputs
struct Signals {
    files: Vec<String>,
    dependencies: BTreeSet<String>,
}

impl Signals {
    fn matches(&self, signal: &Signal) -> bool {
        match signal {
            Signal::Dependency(name) => self.dependencies.contains(*name),
            Signal::Extension(ext) => self.files.iter().any(|f| f.ends_with(*ext)),
            Signal::File(name) => self.files.iter().any(|f| f.as_str() == *name),
        }
    }

    fn first_label(&self, rules: &[Rule]) -> Option<String> {
        rules
            .iter()
            .find(|rule| rule.signals.iter().any(|s| self.matches(s)))
            .map(|rule| rule.label.to_string())
    }
}

/// Infers the stack of a repository.
///
/// `manifest_parsed` is the manifest as JSON (see [`parse_manifest`]); when
/// it is absent the dependency names are tokenised out of `manifest_raw`.
pub fn detect_stack(file_names: &[String], manifest_raw: &str, manifest_parsed: Option<&Value>) -> StackInfo {
    let signals = Signals {
        files: file_names.iter().map(|f| f.to_lowercase()).collect(),
        dependencies: match manifest_parsed {
            Some(parsed) => dependencies_from_parsed(parsed),
            None => dependencies_from_raw(manifest_raw),
        },
    };

    let languages: BTreeSet<String> = signals
        .files
        .iter()
        .filter_map(|f| {
            LANGUAGE_EXTENSIONS
                .iter()
                .find(|(ext, _)| f.ends_with(ext))
                .map(|(_, lang)| lang.to_string())
        })
        .collect();

    let stack = StackInfo {
        frontend: signals.first_label(FRONTEND_RULES),
        backend: signals.first_label(BACKEND_RULES),
        framework: signals.first_label(FRAMEWORK_RULES),
        database: signals.first_label(DATABASE_RULES),
        deployment: signals.first_label(DEPLOYMENT_RULES),
        languages: languages.into_iter().collect(),
    };
    debug!("Detected stack: {:?}", stack.detected_labels());
    stack
}

/// Parses a manifest into JSON when its format is understood.
///
/// `package.json` is parsed as JSON and `pyproject.toml` as TOML; anything
/// else, or a parse failure, yields `None`.
pub fn parse_manifest(file_name: &str, raw: &str) -> Option<Value> {
    match file_name.to_lowercase().as_str() {
        "package.json" => serde_json::from_str(raw).ok(),
        "pyproject.toml" => toml::from_str::<toml::Value>(raw)
            .ok()
            .and_then(|v| serde_json::to_value(v).ok()),
        _ => None,
    }
}

fn dependencies_from_parsed(parsed: &Value) -> BTreeSet<String> {
    let mut deps = BTreeSet::new();
    let sections = [
        &parsed["dependencies"],
        &parsed["devDependencies"],
        &parsed["peerDependencies"],
        &parsed["project"]["dependencies"],
        &parsed["project"]["optional-dependencies"],
        &parsed["tool"]["poetry"]["dependencies"],
        &parsed["tool"]["poetry"]["dev-dependencies"],
    ];

    for section in sections {
        collect_dependency_names(section, &mut deps);
    }
    deps
}

fn collect_dependency_names(section: &Value, deps: &mut BTreeSet<String>) {
    match section {
        Value::Object(map) => {
            for (key, value) in map {
                // optional-dependencies nests arrays under group names
                if value.is_array() {
                    collect_dependency_names(value, deps);
                } else {
                    deps.insert(key.to_lowercase());
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter().filter_map(Value::as_str) {
                if let Some(name) = requirement_name(item) {
                    deps.insert(name);
                }
            }
        }
        _ => {}
    }
}

/// Extracts the package name from a requirement line such as `fastapi[all]>=0.100`
fn requirement_name(line: &str) -> Option<String> {
    let name: String = line
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/'))
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

fn dependencies_from_raw(raw: &str) -> BTreeSet<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('-'))
        .flat_map(|line| {
            line.split(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@' | '/')))
                .filter(|token| !token.is_empty())
                .map(str::to_lowercase)
                .collect::<Vec<_>>()
        })
        .collect()
}
