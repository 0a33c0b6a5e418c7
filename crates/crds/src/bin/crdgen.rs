//! Prints the CRDs owned by this project as a multi-document YAML stream.
//!
//! Fleet's `Bundle` and `BundleDeployment` are not included; Fleet installs them.

use crds::{Channel, MultiComputeConfig};
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let docs = [
        serde_yaml::to_string(&Channel::crd())?,
        serde_yaml::to_string(&MultiComputeConfig::crd())?,
    ];
    print!("{}", docs.join("---\n"));
    Ok(())
}
