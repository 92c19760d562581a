//! Static build metadata and module catalog.

use std::collections::BTreeMap;

use crate::config::ModuleConfig;
use crate::models::{
    BuildPackMetadata, Builder, BuilderLanguageMetadata, DockerfileTemplateMetadata, Language,
    LanguageBuilder, LanguageFramework, LanguageSupport, Module, ResourceFilter,
    ResourceIdentifier,
};

const CDN: &str = "https://cdn.devtron.ai/images";
const TEMPLATES: &str = "https://raw.githubusercontent.com/devtron-labs/devtron";

/// Build-pack and Dockerfile template tables, built once at startup.
pub struct CiBuildMetadataService {
    buildpack: BuildPackMetadata,
    dockerfile_templates: DockerfileTemplateMetadata,
}

impl CiBuildMetadataService {
    pub fn new() -> Self {
        Self {
            buildpack: BuildPackMetadata {
                builders: builders(),
                language_builder: language_builders(),
            },
            dockerfile_templates: DockerfileTemplateMetadata {
                language_frameworks: language_frameworks(),
            },
        }
    }

    pub fn buildpack_metadata(&self) -> &BuildPackMetadata {
        &self.buildpack
    }

    pub fn dockerfile_template_metadata(&self) -> &DockerfileTemplateMetadata {
        &self.dockerfile_templates
    }
}

impl Default for CiBuildMetadataService {
    fn default() -> Self {
        Self::new()
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn support(language: Language, env_param: &str, versions: &[&str]) -> LanguageSupport {
    LanguageSupport {
        language,
        builder_lang_env_param: env_param.to_string(),
        versions: strings(versions),
    }
}

fn builder(id: &str, language_support: Vec<LanguageSupport>) -> Builder {
    Builder {
        id: id.to_string(),
        config_link: None,
        entry_point_param: None,
        language_support,
    }
}

fn paketo_support() -> Vec<LanguageSupport> {
    vec![
        support(Language::Java, "BP_JVM_VERSION", &["8", "11"]),
        support(Language::Node, "BP_NODE_VERSION", &["16.x", "14.x"]),
        support(Language::Python, "BP_CPYTHON_VERSION", &["3.6.*"]),
        support(Language::Ruby, "BP_MRI_VERSION", &["2.7.1"]),
        support(Language::DotNet, "BP_DOTNET_FRAMEWORK_VERSION", &["5.0.4"]),
        support(Language::Go, "BP_GO_VERSION", &["1.19"]),
    ]
}

fn builders() -> Vec<Builder> {
    let google = [
        (Language::Java, &["8", "11"][..]),
        (Language::Node, &["16.x", "14.x"][..]),
        (Language::DotNet, &["16.x", "14.x"][..]),
        (Language::Go, &["16.x", "14.x"][..]),
        (Language::Ruby, &["16.x", "14.x"][..]),
        (Language::Python, &["16.x", "14.x"][..]),
        (Language::Php, &["16.x", "14.x"][..]),
    ]
    .into_iter()
    .map(|(language, versions)| support(language, "GOOGLE_RUNTIME_VERSION", versions))
    .collect();

    let heroku = vec![
        support(Language::Java, "", &["8", "11"]),
        support(Language::Node, "", &["16.x", "14.x"]),
        support(Language::Ruby, "", &["16.x", "14.x"]),
        support(Language::Python, "", &["16.x", "14.x"]),
        support(Language::Php, "", &["16.x", "14.x"]),
        support(Language::Go, "GOVERSION", &["16.x", "14.x"]),
    ];

    vec![
        builder("gcr.io/buildpacks/builder:v1", google),
        builder("paketobuildpacks/builder:full", paketo_support()),
        builder("paketobuildpacks/builder:base", paketo_support()),
        builder(
            "paketobuildpacks/builder:tiny",
            vec![
                support(Language::Java, "BP_JVM_VERSION", &["8", "11"]),
                support(Language::Go, "BP_GO_VERSION", &["1.18", "1.19"]),
            ],
        ),
        builder("heroku/buildpacks:18", heroku.clone()),
        builder("heroku/buildpacks:20", heroku),
    ]
}

fn language_builder(
    language: Language,
    icon: &str,
    versions: &[&str],
    builders: &[(&str, &str)],
) -> LanguageBuilder {
    LanguageBuilder {
        language,
        language_icon: format!("{CDN}/{icon}"),
        versions: strings(versions),
        builder_language_metadata: builders
            .iter()
            .map(|(id, env_param)| BuilderLanguageMetadata {
                id: id.to_string(),
                builder_lang_env_param: env_param.to_string(),
            })
            .collect(),
    }
}

fn language_builders() -> Vec<LanguageBuilder> {
    const GOOGLE: &str = "gcr.io/buildpacks/builder:v1";
    const FULL: &str = "paketobuildpacks/builder:full";
    const BASE: &str = "paketobuildpacks/builder:base";
    const TINY: &str = "paketobuildpacks/builder:tiny";
    const HEROKU: &str = "heroku/buildpacks:20";

    vec![
        language_builder(
            Language::Java,
            "ic-Java.png",
            &["8", "11"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_JVM_VERSION"),
                (BASE, "BP_JVM_VERSION"),
                (TINY, "BP_JVM_VERSION"),
                (HEROKU, "DEVTRON_LANG_VERSION"),
            ],
        ),
        language_builder(
            Language::Python,
            "ic-python.png",
            &["3.7.*"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_CPYTHON_VERSION"),
                (BASE, "BP_CPYTHON_VERSION"),
                (HEROKU, "DEVTRON_LANG_VERSION"),
            ],
        ),
        language_builder(
            Language::Php,
            "ic-php.png",
            &["7.4"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_PHP_VERSION"),
                (BASE, "BP_PHP_VERSION"),
                (HEROKU, ""),
            ],
        ),
        language_builder(
            Language::Go,
            "ic-go.png",
            &["1.18", "1.19"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_GO_VERSION"),
                (BASE, "BP_GO_VERSION"),
                (TINY, "BP_GO_VERSION"),
                (HEROKU, "GOVERSION"),
            ],
        ),
        language_builder(
            Language::Ruby,
            "ic-ruby.png",
            &["2.7"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_MRI_VERSION"),
                (BASE, "BP_MRI_VERSION"),
                (HEROKU, ""),
            ],
        ),
        language_builder(
            Language::Node,
            "ic-nodejs.png",
            &["16.x", "18.x"],
            &[
                (GOOGLE, "GOOGLE_RUNTIME_VERSION"),
                (FULL, "BP_NODE_VERSION"),
                (BASE, "BP_NODE_VERSION"),
                (HEROKU, "DEVTRON_LANG_VERSION"),
            ],
        ),
    ]
}

fn framework(
    language: Language,
    framework: Option<&str>,
    icon: &str,
    template_path: &str,
) -> LanguageFramework {
    LanguageFramework {
        language,
        framework: framework.map(str::to_string),
        language_icon: format!("{CDN}/{icon}"),
        template_url: format!("{TEMPLATES}/{template_path}"),
    }
}

fn language_frameworks() -> Vec<LanguageFramework> {
    vec![
        framework(
            Language::Java,
            Some("Maven"),
            "ic-Java.png",
            "main/sample-docker-templates/java/Maven_Dockerfile",
        ),
        framework(
            Language::Java,
            Some("Gradle"),
            "ic-Java.png",
            "main/sample-docker-templates/java/Gradle_Dockerfile",
        ),
        framework(
            Language::Go,
            None,
            "ic-go.png",
            "main/sample-docker-templates/go/Dockerfile",
        ),
        framework(
            Language::Python,
            Some("Django"),
            "ic-python.png",
            "buildpack-support/sample-docker-templates/django/Dockerfile",
        ),
        framework(
            Language::Python,
            Some("Flask"),
            "ic-python.png",
            "buildpack-support/sample-docker-templates/flask/Dockerfile",
        ),
        framework(
            Language::Node,
            None,
            "ic-nodejs.png",
            "buildpack-support/sample-docker-templates/node/Dockerfile",
        ),
    ]
}

// Module descriptions are HTML rendered as-is by the dashboard.
const ARGO_CD_DESCRIPTION: &str = "<div class=\"module-details__feature-info fs-14 fw-4\"><p>GitOps is an operational framework that takes DevOps best practices used for application development such as version control, collaboration, compliance and applies them to infrastructure automation. Similar to how teams use application source code, operations teams that adopt GitOps use configuration files stored as code (infrastructure as code).</p><p>Devtron uses GitOps to automate the process of provisioning infrastructure. GitOps configuration files generate the same infrastructure environment every time it’s deployed, just as application source code generates the same application binaries every time it’s built.</p><h3 class=\"module-details__features-list-heading fs-14 fw-6\">Features:</h3><ul class=\"module-details__features-list pl-22 mb-24\"><li>Implements GitOps to manage the state of Kubernetes applications.</li><li>Simplified and abstracted integration with ArgoCD for GitOps operation.</li><li>No prior knowledge of ArgoCD is required.</li></ul></div>";

const CLAIR_DESCRIPTION: &str = "<div class=\"module-details__feature-info fs-14 fw-4\"><p>When you work with containers (Docker) you are not only packaging your application but also part of the OS. It is crucial to know what kind of libraries might be vulnerable in your container. One way to find this information is to look at the Docker registry [Hub or Quay.io] security scan. This means your vulnerable image is already on the Docker registry.</p><p>What you want is a scan as a part of CI/CD pipeline that stops the Docker image push on vulnerabilities:</p><ul class=\"module-details__features-list pl-22 mb-24\" style=\"\n    list-style: decimal;\n\"><li>Build and test your application\n</li><li>Build the container\n</li><li>Test the container for vulnerabilities\n</li><li>Check the vulnerabilities against allowed ones, if everything is allowed then pass otherwise fail\n</li></ul><p>This straightforward process is not that easy to achieve when using the services like Docker Hub or Quay.io. This is because they work asynchronously which makes it harder to do straightforward CI/CD pipeline.</p><h3 class=\"module-details__features-list-heading fs-14 fw-6\">Features:</h3><ul class=\"module-details__features-list pl-22 mb-24\"><li>Scans an image against Clair server</li><li>Compares the vulnerabilities against a whitelist</li><li>Blocks images from deployment if blacklisted / blocked vulnerabilities are detected</li><li>Ability to define hierarchical security policy (Global / Cluster / Environment / Application) to allow / block vulnerabilities based on criticality (High / Moderate / Low)</li><li>Shows security vulnerabilities detected in deployed applications</li></ul></div>";

const NOTIFIER_DESCRIPTION: &str = "<div class=\"module-details__feature-info fs-14 fw-4\"><p>Receive alerts for build and deployment pipelines on trigger, success, and failure events. An alert will be sent to desired slack channel and Email(supports SES and SMTP configurations) with the required information to take be able to quick actions whenever required.</p><h3 class=\"module-details__features-list-heading fs-14 fw-6\">Features:</h3><ul class=\"module-details__features-list pl-22 mb-24\"><li>Receive alerts for start, success, and failure events on desired build pipelines</li><li>Receive alerts for start, success, and failure events on desired deployment pipelines</li><li>Receive alerts on desired Slack channels via webhook</li><li>Receive alerts on your email address (supports SES and SMTP)</li></ul><h3 class=\"module-details__features-list-heading fs-14 fw-6\">How to use the Integration?</h3><span>After you install the integration, you can configure notifications from Global configurations &gt; Notifications section. For more details on how to configure notifications, refer\n<a href=\"https://docs.devtron.ai/getting-started/global-configurations/manage-notification\" target=\"_blank\">here</a>.\n</span></div>";

const GRAFANA_DESCRIPTION: &str = "<div class=\"module-details__feature-info fs-14 fw-4\"><p>Devtron leverages the power of Grafana to show application metrics like CPU, Memory utilization, Status 4xx/ 5xx/ 2xx, Throughput, and Latency.</p><h3 class=\"module-details__features-list-heading fs-14 fw-6\">Features:</h3><ul class=\"module-details__features-list pl-22 mb-24\"><li>CPU usage: Displays the overall utilization of CPU by an application. It is available as aggregated or per pod.</li><li>Memory usage: Displays the overall utilization of memory by an application. It is available as aggregated or per pod.</li><li>Throughput: Indicates the number of requests processed by an application per minute.</li><li>Status codes: Indicates the application’s response to the client’s request with a specific status code as shown below:<ul class=\"module-details__features-list pl-22 mb-24\"><li>1xx: Communicates transfer protocol level information</li><li>2xx: Client’s request is processed successfully</li><li>3xx: Client must take some additional action to complete their request</li><li>4xx: There is an error on the client side</li><li>5xx: There is an error on the server side</li></ul></li></ul><h3 class=\"module-details__features-list-heading fs-14 fw-6\">How to use the Integration?</h3><span>After you install the integration, you can enable application metrics for all or specific environments in an application. For more details on how to enable application metrics, refer \n<a href=\"https://docs.devtron.ai/v/v0.5/usage/applications/app-details/app-metrics\" target=\"_blank\">here</a>\n</span></div>";

const TRIVY_DESCRIPTION: &str = "<div class=\"module-details__feature-info fs-14 fw-4\"><p>When you work with containers (Docker) you are not only packaging your application but also part of the OS. It is crucial to know what kind of libraries might be vulnerable in your container. One way to find this information is to look at the Docker registry [Hub or Quay.io] security scan. This means your vulnerable image is already on the Docker registry.</p><p>What you want is a scan as a part of CI/CD pipeline that stops the Docker image push on vulnerabilities:</p><ul class=\"module-details__features-list pl-22 mb-24\" style=\"\n    list-style: decimal;\n\"><li>Build and test your application\n</li><li>Build the container\n</li><li>Test the container for vulnerabilities\n</li><li>Check the vulnerabilities against allowed ones, if everything is allowed then pass otherwise fail\n</li></ul><p>This straightforward process is not that easy to achieve when using the services like Docker Hub or Quay.io. This is because they work asynchronously which makes it harder to do straightforward CI/CD pipeline.</p><h3 class=\"module-details__features-list-heading fs-14 fw-6\">Features:</h3><ul class=\"module-details__features-list pl-22 mb-24\"><li>Scans an image against Trivy CLI</li><li>Compares the vulnerabilities against a whitelist</li><li>Blocks images from deployment if blacklisted / blocked vulnerabilities are detected</li><li>Ability to define hierarchical security policy (Global / Cluster / Environment / Application) to allow / block vulnerabilities based on criticality (High / Moderate / Low)</li><li>Shows security vulnerabilities detected in deployed applications</li></ul></div>";

/// Installable modules. Only the `cicd` entry is configurable.
pub struct ModuleCatalog {
    cicd: Module,
}

impl ModuleCatalog {
    pub fn new(config: &ModuleConfig) -> Self {
        Self {
            cicd: Module {
                id: 1,
                name: "cicd".to_string(),
                base_min_version_supported: config.base_min_version_supported.clone(),
                is_included_in_legacy_full_package: true,
                description: config.description.clone(),
                title: config.title.clone(),
                icon: config.icon.clone(),
                info: config.info.clone(),
                assets: config.assets.clone(),
                ..Default::default()
            },
        }
    }

    /// Catalog v1: only the base CI/CD module.
    pub fn modules(&self) -> Vec<Module> {
        vec![self.cicd.clone()]
    }

    /// Catalog v2: every module, with dependencies and resource filters.
    pub fn modules_v2(&self) -> Vec<Module> {
        vec![
            self.cicd.clone(),
            Module {
                id: 2,
                name: "argo-cd".to_string(),
                title: "GitOps (Argo CD)".to_string(),
                description: ARGO_CD_DESCRIPTION.to_string(),
                icon: format!("{CDN}/ic-integration-gitops-argocd.png"),
                info: "Declarative GitOps CD for Kubernetes powered by Argo CD".to_string(),
                assets: vec![format!("{CDN}/img-gitops-1.png")],
                resource_filter: Some(label_filter("app.kubernetes.io/part-of", "argocd")),
                ..dependent_module("v0.6.0")
            },
            Module {
                id: 3,
                name: "security.clair".to_string(),
                title: "Vulnerability Scanning (Clair)".to_string(),
                description: CLAIR_DESCRIPTION.to_string(),
                icon: format!("{CDN}/ic-integration-security-clair.png"),
                info: "Seamless integration with Clair for vulnerability scanning of images."
                    .to_string(),
                assets: clair_assets(),
                module_type: Some("security".to_string()),
                ..dependent_module("v0.6.0")
            },
            Module {
                id: 4,
                name: "notifier".to_string(),
                title: "Notifications".to_string(),
                description: NOTIFIER_DESCRIPTION.to_string(),
                icon: format!("{CDN}/ic-integration-notifications.png"),
                info: "Get notified when build and deployment pipelines start, fail or succeed."
                    .to_string(),
                assets: (1..=3)
                    .map(|i| format!("{CDN}/img-notification-{i}.png"))
                    .collect(),
                ..dependent_module("v0.6.0")
            },
            Module {
                id: 5,
                name: "monitoring.grafana".to_string(),
                title: "Monitoring (Grafana)".to_string(),
                description: GRAFANA_DESCRIPTION.to_string(),
                icon: format!("{CDN}/ic-integration-grafana.png"),
                info: "Enables metrics like CPU, memory, status codes, throughput, and latency for applications."
                    .to_string(),
                assets: vec![
                    format!("{CDN}/img-grafana-1.png"),
                    format!("{CDN}/img-grafana-2.png"),
                ],
                resource_filter: Some(label_filter("app.kubernetes.io/name", "grafana")),
                ..dependent_module("v0.6.0")
            },
            Module {
                id: 6,
                name: "security.trivy".to_string(),
                title: "Vulnerability Scanning (Trivy)".to_string(),
                description: TRIVY_DESCRIPTION.to_string(),
                icon: format!("{CDN}/ic-integration-security-trivy.png"),
                info: "Seamless integration with Trivy for vulnerability scanning of images."
                    .to_string(),
                assets: clair_assets(),
                module_type: Some("security".to_string()),
                ..dependent_module("v0.6.18")
            },
        ]
    }

    /// Look a module up by name. Unknown names yield an empty module.
    pub fn module_by_name(&self, name: &str) -> Module {
        self.modules_v2()
            .into_iter()
            .find(|m| m.name == name)
            .unwrap_or_default()
    }
}

fn dependent_module(base_min_version: &str) -> Module {
    Module {
        base_min_version_supported: base_min_version.to_string(),
        is_included_in_legacy_full_package: true,
        dependent_modules: vec![1],
        ..Default::default()
    }
}

fn label_filter(key: &str, value: &str) -> ResourceFilter {
    ResourceFilter {
        global_filter: ResourceIdentifier {
            labels: BTreeMap::from([(key.to_string(), value.to_string())]),
        },
    }
}

fn clair_assets() -> Vec<String> {
    (1..=4)
        .map(|i| format!("{CDN}/img-security-clair-{i}.png"))
        .collect()
}
