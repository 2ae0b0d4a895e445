use anyhow::Result;
use clap::Parser;
use evsim::{
    AttributeList, LogConfig, Object, ObjectType, Ptr, Simulator, Time, TypeId, TypeRegistry,
    attribute::{make_accessor, make_uinteger_checker},
    create_object,
    trace::{
        Callback, CompositeTraceResolver, TraceContext, TraceContextElement, TracePrinter,
        TracedCallback, TracedValue, make_trace_source_accessor,
    },
};
use std::{fmt, rc::Rc};

/// Build a few nodes with devices and trace them through paths
#[derive(Parser)]
struct Command {
    #[arg(long, default_value = "2")]
    nodes: usize,

    #[arg(long, default_value = "2")]
    devices: usize,

    /// path to connect the packet counter to
    #[arg(long, default_value = "/nodes/*/devices/(0|1)/tx")]
    path: String,

    /// list the trace sources and exit
    #[arg(long)]
    list: bool,
}

#[derive(Clone)]
struct NodeIndex(usize);

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node={}", self.0)
    }
}

impl TraceContextElement for NodeIndex {
    fn name() -> &'static str {
        "NodeIndex"
    }
}

#[derive(Clone)]
struct DeviceIndex(usize);

impl fmt::Display for DeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device={}", self.0)
    }
}

impl TraceContextElement for DeviceIndex {
    fn name() -> &'static str {
        "DeviceIndex"
    }
}

#[derive(Default)]
struct Device {
    mtu: u16,
    tx: TracedCallback<u32>,
    backlog: TracedValue<u32>,
}

impl Object for Device {}

impl ObjectType for Device {
    fn get_type_id(registry: &TypeRegistry) -> TypeId {
        registry.lookup_or_register("Device", |builder| {
            builder
                .add_constructor::<Device>()
                .add_attribute(
                    "Mtu",
                    "largest packet the device sends",
                    1_500u16,
                    make_accessor(|d: &Device| d.mtu, |d: &mut Device, mtu: u16| d.mtu = mtu),
                    make_uinteger_checker::<u16>(),
                )
                .add_trace_source(
                    "tx",
                    "a packet is sent",
                    make_trace_source_accessor::<Device>(|d| &d.tx),
                )
                .add_trace_source(
                    "backlog",
                    "number of bytes waiting to be sent",
                    make_trace_source_accessor::<Device>(|d| &d.backlog),
                );
        })
    }
}

#[derive(Default)]
struct Node {
    devices: Vec<Ptr<Device>>,
}

impl Object for Node {
    fn add_trace_items<'a>(&'a self, resolver: &mut CompositeTraceResolver<'a>) {
        resolver.add_array("devices", self.devices.iter().cloned(), DeviceIndex);
    }
}

impl ObjectType for Node {
    fn get_type_id(registry: &TypeRegistry) -> TypeId {
        registry.lookup_or_register("Node", |builder| {
            builder.add_constructor::<Node>();
        })
    }
}

#[derive(Default)]
struct World {
    nodes: Vec<Ptr<Node>>,
}

impl Object for World {
    fn add_trace_items<'a>(&'a self, resolver: &mut CompositeTraceResolver<'a>) {
        resolver.add_array("nodes", self.nodes.iter().cloned(), NodeIndex);
    }
}

impl ObjectType for World {
    fn get_type_id(registry: &TypeRegistry) -> TypeId {
        registry.lookup_or_register("World", |builder| {
            builder.add_constructor::<World>();
        })
    }
}

fn main() -> Result<()> {
    LogConfig::from_env()?.try_init()?;
    let cmd = Command::parse();
    let registry = TypeRegistry::global();

    let world = create_object::<World>(&registry, &AttributeList::new());
    for _ in 0..cmd.nodes {
        let node = create_object::<Node>(&registry, &AttributeList::new());
        for _ in 0..cmd.devices {
            let device = create_object::<Device>(&registry, &AttributeList::new());
            node.borrow_mut().devices.push(device);
        }
        world.borrow_mut().nodes.push(node);
    }

    if cmd.list {
        print!("{}", world.collect_sources());
        return Ok(());
    }

    let printer: TracePrinter = Rc::new(|context: &TraceContext, value: &str| {
        println!("{} {context} {value}", Simulator::now())
    });
    world.trace_all(&printer);

    let counter = Callback::new(|context: &TraceContext, size: &u32| {
        println!("{} counted {size} bytes on {context}", Simulator::now())
    });
    world.trace_connect(&cmd.path, &counter);

    let nodes = world.borrow().nodes.clone();
    for (n, node) in nodes.into_iter().enumerate() {
        let devices = node.borrow().devices.clone();
        for (d, device) in devices.into_iter().enumerate() {
            let size = 100 * (n as u32 + 1) + d as u32;
            let delay = Time::from_millis((n * cmd.devices + d) as u64);
            Simulator::schedule(delay, move || {
                let device = device.borrow();
                device.backlog.set(size);
                device.tx.fire(&size);
                device.backlog.set(0);
            });
        }
    }

    Simulator::run();
    Simulator::destroy();
    Ok(())
}
