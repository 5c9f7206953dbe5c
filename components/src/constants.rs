/// Helper macro to avoid retyping the namespace of AWS resource kinds. When given no parameters,
/// this returns the namespace. When given a string literal parameter it adds `:parameter` to the
/// end.
macro_rules! aws {
    () => {
        "aws"
    };
    ($s:literal) => {
        concat!(aws!(), ":", $s)
    };
}

// Resource kinds
pub const AUTOSCALING_GROUP: &str = aws!("autoscaling:Group");
pub const EIP: &str = aws!("ec2:Eip");
pub const EKS_CLUSTER: &str = aws!("eks:Cluster");
pub const INSTANCE: &str = aws!("ec2:Instance");
pub const INSTANCE_PROFILE: &str = aws!("iam:InstanceProfile");
pub const INTERNET_GATEWAY: &str = aws!("ec2:InternetGateway");
pub const KEY_PAIR: &str = aws!("ec2:KeyPair");
pub const LAUNCH_CONFIGURATION: &str = aws!("ec2:LaunchConfiguration");
pub const NAT_GATEWAY: &str = aws!("ec2:NatGateway");
pub const ROLE: &str = aws!("iam:Role");
pub const ROLE_POLICY_ATTACHMENT: &str = aws!("iam:RolePolicyAttachment");
pub const ROUTE: &str = aws!("ec2:Route");
pub const ROUTE_TABLE: &str = aws!("ec2:RouteTable");
pub const ROUTE_TABLE_ASSOCIATION: &str = aws!("ec2:RouteTableAssociation");
pub const SECURITY_GROUP: &str = aws!("ec2:SecurityGroup");
pub const SECURITY_GROUP_RULE: &str = aws!("ec2:SecurityGroupRule");
pub const SUBNET: &str = aws!("ec2:Subnet");
pub const VPC: &str = aws!("ec2:Vpc");
pub const CONFIG_MAP: &str = "kubernetes:core/v1:ConfigMap";

// Network
pub const VPC_CIDR: &str = "10.0.0.0/16";
pub const ANY_CIDR: &str = "0.0.0.0/0";
pub const MIN_SUBNETS: u32 = 2;
pub const MAX_SUBNETS: u32 = 3;
pub const SSH_PORT: u16 = 22;
pub const HTTPS_PORT: u16 = 443;

// IAM
pub const POLICY_ARN_PREFIX: &str = "arn:aws:iam::aws:policy/";
pub const EKS_SERVICE_PRINCIPAL: &str = "eks.amazonaws.com";
pub const EC2_SERVICE_PRINCIPAL: &str = "ec2.amazonaws.com";
pub const CONTROL_PLANE_POLICIES: [&str; 2] = ["AmazonEKSClusterPolicy", "AmazonEKSServicePolicy"];
pub const WORKER_POLICIES: [&str; 3] = [
    "AmazonEKSWorkerNodePolicy",
    "AmazonEKS_CNI_Policy",
    "AmazonEC2ContainerRegistryReadOnly",
];

// Images
pub const EKS_NODE_IMAGE_PREFIX: &str = "amazon-eks-node";
pub const INSTANCE_IMAGE_PATTERN: &str = "amzn-ami-hvm-*";

// Kubernetes
pub const AWS_AUTH_NAME: &str = "aws-auth";
pub const AWS_AUTH_NAMESPACE: &str = "kube-system";
pub const NODE_USERNAME: &str = "system:node:{{EC2PrivateDNSName}}";
pub const NODE_GROUPS: [&str; 2] = ["system:bootstrappers", "system:nodes"];
pub const CLUSTER_OWNERSHIP_TAG_PREFIX: &str = "kubernetes.io/cluster/";

/// Where a bastion writes the private key it is given.
pub const BASTION_KEY_FILE: &str = "bastion.pem";

pub const KEY_BITS: usize = 2048;
