//! Declaration of the cluster stack whose ingress chart consumes the resolved values.

use std::collections::{BTreeMap, HashSet};

use serde_json::{json, Value};

use crate::{
    handler::DEFAULT_PARAMETER_NAME,
    values::{Environment, HelmValues},
};

pub mod resource;
pub use resource::{attribute, reference, sub, Resource, ResourceKind};

/// ARN of the environment parameter; `Ref` on the parameter yields its name, which starts with `/`.
const PARAMETER_ARN: &str =
    "arn:${AWS::Partition}:ssm:${AWS::Region}:${AWS::AccountId}:parameter${EnvironmentParameter}";

/// An ordered set of resources with dependencies between them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stack {
    resources: Vec<Resource>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resource to this stack.
    pub fn with(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn get(&self, logical_id: &str) -> Option<&Resource> {
        self.resources
            .iter()
            .find(|resource| resource.logical_id == logical_id)
    }

    /// Returns the resources in an order in which each comes after all of its dependencies.
    ///
    /// Among resources whose dependencies are satisfied, declaration order wins.
    pub fn ordered(&self) -> Result<Vec<&Resource>, StackError> {
        let mut declared = HashSet::new();
        for resource in &self.resources {
            if !declared.insert(resource.logical_id.as_str()) {
                return Err(StackError::Duplicate(resource.logical_id.clone()));
            }
        }

        let mut pending = Vec::with_capacity(self.resources.len());
        for resource in &self.resources {
            let deps = resource.dependencies();
            if let Some(unknown) = deps.iter().find(|dep| !declared.contains(dep.as_str())) {
                return Err(StackError::UnknownDependency {
                    resource: resource.logical_id.clone(),
                    dependency: unknown.clone(),
                });
            }
            pending.push((resource, deps));
        }

        let mut placed = HashSet::new();
        let mut ordered = Vec::with_capacity(pending.len());
        while !pending.is_empty() {
            let Some(next) = pending
                .iter()
                .position(|(_, deps)| deps.iter().all(|dep| placed.contains(dep.as_str())))
            else {
                return Err(StackError::Cycle(
                    pending
                        .iter()
                        .map(|(resource, _)| resource.logical_id.clone())
                        .collect(),
                ));
            };

            let (resource, _) = pending.remove(next);
            placed.insert(resource.logical_id.as_str());
            ordered.push(resource);
        }

        Ok(ordered)
    }

    /// Renders a CloudFormation-shaped template of this stack.
    pub fn synth(&self) -> Result<Value, StackError> {
        let resources: serde_json::Map<_, _> = self
            .ordered()?
            .into_iter()
            .map(|resource| {
                let mut body = json!({
                    "Type": resource.kind.type_name(),
                    "Properties": resource.kind.properties(),
                });
                if !resource.depends_on.is_empty() {
                    body["DependsOn"] = json!(resource.depends_on);
                }
                (resource.logical_id.clone(), body)
            })
            .collect();

        Ok(json!({ "Resources": resources }))
    }

    /// The EKS cluster with an ingress-nginx release sized for `environment`.
    pub fn eks_helm(environment: Environment) -> Self {
        Stack::new()
            .with(Resource::new(
                "EnvironmentParameter",
                ResourceKind::StringParameter {
                    name: DEFAULT_PARAMETER_NAME.to_owned(),
                    value: environment.to_string(),
                    description: "Deployment environment".to_owned(),
                },
            ))
            .with(Resource::new(
                "HelmValueGeneratorRole",
                ResourceKind::ExecutionRole,
            ))
            .with(Resource::new(
                "HelmValueGenerator",
                ResourceKind::Function {
                    runtime: "provided.al2023".to_owned(),
                    handler: "bootstrap".to_owned(),
                    role: "HelmValueGeneratorRole".to_owned(),
                    code_key: "helm-values-resolver.zip".to_owned(),
                    environment: BTreeMap::from([(
                        "SSM_PARAMETER_NAME".to_owned(),
                        reference("EnvironmentParameter"),
                    )]),
                },
            ))
            .with(Resource::new(
                "HelmValueGeneratorReadPolicy",
                ResourceKind::Policy {
                    policy_name: "HelmValueGeneratorReadPolicy".to_owned(),
                    actions: [
                        "ssm:DescribeParameters",
                        "ssm:GetParameters",
                        "ssm:GetParameter",
                        "ssm:GetParameterHistory",
                    ]
                    .map(str::to_owned)
                    .to_vec(),
                    resource: sub(PARAMETER_ARN),
                    role: "HelmValueGeneratorRole".to_owned(),
                },
            ))
            .with(Resource::new(
                "HelmValuesProviderRole",
                ResourceKind::ExecutionRole,
            ))
            .with(Resource::new(
                "HelmValuesProviderInvokePolicy",
                ResourceKind::Policy {
                    policy_name: "HelmValuesProviderInvokePolicy".to_owned(),
                    actions: vec!["lambda:InvokeFunction".to_owned()],
                    resource: attribute("HelmValueGenerator", "Arn"),
                    role: "HelmValuesProviderRole".to_owned(),
                },
            ))
            .with(Resource::new(
                "HelmValuesProvider",
                ResourceKind::Provider {
                    on_event: "HelmValueGenerator".to_owned(),
                    role: "HelmValuesProviderRole".to_owned(),
                    code_key: "custom-resource-provider-framework.zip".to_owned(),
                },
            ))
            .with(
                Resource::new(
                    "HelmValuesResource",
                    ResourceKind::CustomResource {
                        resource_type: "AWS::CloudFormation::CustomResource".to_owned(),
                        service_token: "HelmValuesProvider".to_owned(),
                    },
                )
                .depends_on("EnvironmentParameter")
                .depends_on("HelmValueGeneratorReadPolicy")
                .depends_on("HelmValuesProviderInvokePolicy"),
            )
            .with(Resource::new(
                "EKSCluster",
                ResourceKind::Cluster {
                    name: "eks-cluster".to_owned(),
                    version: "1.28".to_owned(),
                },
            ))
            .with(Resource::new(
                "DefaultCapacity",
                ResourceKind::Nodegroup {
                    cluster: "EKSCluster".to_owned(),
                    instance_types: vec!["t3.micro".to_owned()],
                    desired_size: 2,
                    min_size: 1,
                    max_size: 3,
                },
            ))
            .with(Resource::new(
                "TestUserMapping",
                ResourceKind::UserMapping {
                    cluster: "EKSCluster".to_owned(),
                    user: "test".to_owned(),
                    groups: vec!["system:masters".to_owned()],
                },
            ))
            .with(
                Resource::new(
                    "IngressNginx",
                    ResourceKind::HelmChart {
                        cluster: "EKSCluster".to_owned(),
                        chart: "ingress-nginx".to_owned(),
                        release: "nginx".to_owned(),
                        repository: "https://kubernetes.github.io/ingress-nginx".to_owned(),
                        namespace: "ingress-nginx".to_owned(),
                        create_namespace: true,
                        values: json!({
                            "controller": {
                                "replicaCount": attribute(
                                    "HelmValuesResource",
                                    HelmValues::REPLICA_COUNT_ATTRIBUTE,
                                ),
                            },
                        }),
                    },
                )
                .depends_on("HelmValuesResource"),
            )
    }
}

/// The error type returned by [`Stack::ordered`] and [`Stack::synth`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StackError {
    #[error("resource {0} is declared more than once")]
    Duplicate(String),
    #[error("resource {resource} depends on undeclared resource {dependency}")]
    UnknownDependency { resource: String, dependency: String },
    #[error("dependency cycle among resources {0:?}")]
    Cycle(Vec<String>),
}
