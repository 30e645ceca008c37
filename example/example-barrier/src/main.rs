#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;

mod gen_point;

use std::time::Duration;

use rlink_barrier::api::element::Element;
use rlink_barrier::api::properties::{BarrierProperties, Properties};
use rlink_barrier::channel::{named_channel_with_base, ChannelBaseOn};
use rlink_barrier::metrics::Tag;
use rlink_barrier::runtime::BarrierNode;
use rlink_barrier::utils::{logger, parse_arg, parse_arg_with, thread};

use crate::gen_point::{create_point, host_group};

/// `example-barrier log_level=DEBUG config=barrier.yaml`
/// or `example-barrier idle=200 period=0`
pub fn main() -> anyhow::Result<()> {
    logger::init_log(parse_arg_with("log_level", "INFO").as_str(), None)?;

    let properties = match parse_arg("config") {
        Ok(path) => Properties::load_yaml(path)?,
        Err(_e) => {
            let mut properties = Properties::new();
            let idle: u64 = parse_arg_with("idle", "200").parse()?;
            let period: u64 = parse_arg_with("period", "0").parse()?;
            properties.set_barrier_idle(Duration::from_millis(idle));
            properties.set_barrier_period(Duration::from_millis(period));
            properties
        }
    };
    info!("barrier properties: {:?}", properties);

    let tags = vec![Tag::new("job", "example-barrier")];
    let (input_sender, input_receiver) =
        named_channel_with_base("BarrierInput", tags.clone(), 0, ChannelBaseOn::Unbounded);
    let (output_sender, output_receiver) =
        named_channel_with_base("BarrierOutput", tags, 0, ChannelBaseOn::Unbounded);

    let node = BarrierNode::new("barrier", &properties, input_receiver, vec![output_sender])?;
    let cardinality = node.cardinality();
    let node_handle = thread::spawn("barrier-node", move || node.run())?;

    let sink_handle = thread::spawn("barrier-sink", move || {
        let mut points = 0;
        while let Ok(element) = output_receiver.recv() {
            match element {
                Element::Barrier(barrier) => info!("{}", barrier),
                Element::DeleteGroup(delete) => info!("group {} deleted", delete.group_id),
                _ => points += 1,
            }
        }
        points
    })?;

    // host `a` reports every 50ms, host `b` once and then goes quiet
    input_sender.send(create_point("b", 0.5))?;
    for n in 0..40 {
        input_sender.send(create_point("a", n as f64))?;
        std::thread::sleep(Duration::from_millis(50));
    }
    info!("group cardinality {}", cardinality.load());

    input_sender.send(Element::new_delete_group(host_group("b").id))?;
    std::thread::sleep(Duration::from_millis(500));
    info!("group cardinality {}", cardinality.load());

    rlink_barrier::metrics::compute();

    drop(input_sender);
    node_handle
        .join()
        .map_err(|_e| anyhow!("barrier node panicked"))??;
    let points = sink_handle
        .join()
        .map_err(|_e| anyhow!("barrier sink panicked"))?;
    info!("{} points passed through", points);

    Ok(())
}
