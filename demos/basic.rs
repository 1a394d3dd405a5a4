use zstack_edge_http::{EdgeClient, Mode, QueryParams};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = EdgeClient::from_env()?;

    let page = client
        .page_clusters(QueryParams::new().limit(20).sort("-createTime"))
        .await?;
    println!("{} clusters", page.total);

    for cluster in &page.items {
        println!("{:>4} {:<24} {}", cluster.id, cluster.name, cluster.status);
        let nodes = client.page_nodes(cluster.id, QueryParams::new()).await?;
        for node in nodes.items {
            println!("       {} {} {}", node.name, node.ip, node.role);
        }
    }

    if let Ok(name) = std::env::var("ZSTACK_DELETE_CLUSTER") {
        if let Some(cluster) = client.find_cluster_by_name(&name).await? {
            let outcome = client.delete_cluster(cluster.id, Mode::Async).await?;
            println!("delete of {name} accepted as {:?}", outcome.action_id());
        }
    }

    Ok(())
}
