use std::collections::BTreeMap;

use serde_json::{json, Value};

/// A declared resource, identified by its logical id within a [`Stack`](super::Stack).
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub logical_id: String,
    pub kind: ResourceKind,
    /// Explicit ordering constraints, in addition to those implied by references.
    pub depends_on: Vec<String>,
}

impl Resource {
    pub fn new(logical_id: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            logical_id: logical_id.into(),
            kind,
            depends_on: Vec::new(),
        }
    }

    /// Adds an explicit dependency on another resource.
    pub fn depends_on(mut self, logical_id: impl Into<String>) -> Self {
        self.depends_on.push(logical_id.into());
        self
    }

    /// All resources that must exist before this one, explicit dependencies first.
    pub fn dependencies(&self) -> Vec<String> {
        let mut deps = self.depends_on.clone();
        collect_references(&self.kind.properties(), &mut deps);
        let mut seen = Vec::with_capacity(deps.len());
        deps.retain(|dep| {
            if seen.contains(dep) {
                false
            } else {
                seen.push(dep.clone());
                true
            }
        });
        deps
    }
}

/// `{"Ref": logical_id}`
pub fn reference(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{"Fn::GetAtt": [logical_id, attribute]}`
pub fn attribute(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{"Fn::Sub": template}`; `${LogicalId}` placeholders count as references.
pub fn sub(template: &str) -> Value {
    json!({ "Fn::Sub": template })
}

/// Bucket the deployment tooling uploads function code to.
pub const ASSET_BUCKET: &str = "cdk-hnb659fds-assets-${AWS::AccountId}-${AWS::Region}";

const BASIC_EXECUTION_POLICY: &str =
    "arn:${AWS::Partition}:iam::aws:policy/service-role/AWSLambdaBasicExecutionRole";

fn collect_references(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(target)) = map.get("Ref") {
                out.push(target.clone());
            }
            if let Some(Value::String(target)) = map
                .get("Fn::GetAtt")
                .and_then(|args| args.as_array())
                .and_then(|args| args.first())
            {
                out.push(target.clone());
            }
            if let Some(Value::String(template)) = map.get("Fn::Sub") {
                out.extend(placeholders(template));
            }
            for nested in map.values() {
                collect_references(nested, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_references(item, out);
            }
        }
        _ => {}
    }
}

/// Logical ids named by `${..}` placeholders, skipping pseudo parameters such as `${AWS::Region}`.
fn placeholders(template: &str) -> impl Iterator<Item = String> + '_ {
    template
        .split("${")
        .skip(1)
        .filter_map(|rest| rest.split_once('}'))
        .map(|(name, _)| name.split('.').next().unwrap_or(name))
        .filter(|name| !name.contains("::"))
        .map(str::to_owned)
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResourceKind {
    StringParameter {
        name: String,
        value: String,
        description: String,
    },
    /// An IAM role assumable by Lambda with basic execution (logging) rights.
    ExecutionRole,
    Function {
        runtime: String,
        handler: String,
        role: String,
        /// Object key of the code bundle in [`ASSET_BUCKET`].
        code_key: String,
        environment: BTreeMap<String, Value>,
    },
    /// An inline policy allowing `actions` on `resource`, attached to `role`.
    Policy {
        policy_name: String,
        actions: Vec<String>,
        resource: Value,
        role: String,
    },
    /// The custom resource framework function that invokes `on_event`
    /// and reports its returned response back to CloudFormation.
    Provider {
        on_event: String,
        role: String,
        code_key: String,
    },
    CustomResource {
        resource_type: String,
        service_token: String,
    },
    Cluster { name: String, version: String },
    Nodegroup {
        cluster: String,
        instance_types: Vec<String>,
        desired_size: u32,
        min_size: u32,
        max_size: u32,
    },
    /// Maps an IAM user to Kubernetes groups in the cluster's aws-auth.
    UserMapping {
        cluster: String,
        user: String,
        groups: Vec<String>,
    },
    HelmChart {
        cluster: String,
        chart: String,
        release: String,
        repository: String,
        namespace: String,
        create_namespace: bool,
        values: Value,
    },
}

impl ResourceKind {
    pub fn type_name(&self) -> &str {
        match self {
            ResourceKind::StringParameter { .. } => "AWS::SSM::Parameter",
            ResourceKind::ExecutionRole => "AWS::IAM::Role",
            ResourceKind::Function { .. } | ResourceKind::Provider { .. } => "AWS::Lambda::Function",
            ResourceKind::Policy { .. } => "AWS::IAM::Policy",
            ResourceKind::CustomResource { resource_type, .. } => resource_type.as_str(),
            ResourceKind::Cluster { .. } => "AWS::EKS::Cluster",
            ResourceKind::Nodegroup { .. } => "AWS::EKS::Nodegroup",
            ResourceKind::UserMapping { .. } => "Custom::AWSCDK-EKS-KubernetesResource",
            ResourceKind::HelmChart { .. } => "Custom::AWSCDK-EKS-HelmChart",
        }
    }

    pub fn properties(&self) -> Value {
        match self {
            ResourceKind::StringParameter {
                name,
                value,
                description,
            } => json!({
                "Name": name,
                "Type": "String",
                "Value": value,
                "Description": description,
            }),
            ResourceKind::ExecutionRole => json!({
                "AssumeRolePolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Principal": { "Service": "lambda.amazonaws.com" },
                        "Action": "sts:AssumeRole",
                    }],
                },
                "ManagedPolicyArns": [sub(BASIC_EXECUTION_POLICY)],
            }),
            ResourceKind::Function {
                runtime,
                handler,
                role,
                code_key,
                environment,
            } => json!({
                "Runtime": runtime,
                "Handler": handler,
                "Role": attribute(role, "Arn"),
                "Code": { "S3Bucket": sub(ASSET_BUCKET), "S3Key": code_key },
                "Environment": { "Variables": environment },
            }),
            ResourceKind::Policy {
                policy_name,
                actions,
                resource,
                role,
            } => json!({
                "PolicyName": policy_name,
                "PolicyDocument": {
                    "Version": "2012-10-17",
                    "Statement": [{
                        "Effect": "Allow",
                        "Action": actions,
                        "Resource": resource,
                    }],
                },
                "Roles": [reference(role)],
            }),
            ResourceKind::Provider {
                on_event,
                role,
                code_key,
            } => json!({
                "Runtime": "nodejs18.x",
                "Handler": "framework.onEvent",
                "Timeout": 900,
                "Role": attribute(role, "Arn"),
                "Code": { "S3Bucket": sub(ASSET_BUCKET), "S3Key": code_key },
                "Environment": {
                    "Variables": { "USER_ON_EVENT_FUNCTION_ARN": attribute(on_event, "Arn") },
                },
            }),
            ResourceKind::CustomResource { service_token, .. } => json!({
                "ServiceToken": attribute(service_token, "Arn"),
            }),
            ResourceKind::Cluster { name, version } => json!({
                "Name": name,
                "Version": version,
            }),
            ResourceKind::Nodegroup {
                cluster,
                instance_types,
                desired_size,
                min_size,
                max_size,
            } => json!({
                "ClusterName": reference(cluster),
                "InstanceTypes": instance_types,
                "ScalingConfig": {
                    "DesiredSize": desired_size,
                    "MinSize": min_size,
                    "MaxSize": max_size,
                },
            }),
            ResourceKind::UserMapping {
                cluster,
                user,
                groups,
            } => json!({
                "ClusterName": reference(cluster),
                "Username": user,
                "Groups": groups,
            }),
            ResourceKind::HelmChart {
                cluster,
                chart,
                release,
                repository,
                namespace,
                create_namespace,
                values,
            } => json!({
                "ClusterName": reference(cluster),
                "Chart": chart,
                "Release": release,
                "Repository": repository,
                "Namespace": namespace,
                "CreateNamespace": create_namespace,
                "Values": values,
            }),
        }
    }
}
