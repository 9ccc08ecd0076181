use std::{thread::sleep, time::Duration};

use log::{error, info};
use vexnet_serial::{
    Connection,
    config::DeviceType,
    protocol::controller::ControllerStatus,
    serial::{self, SerialTransport},
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    simplelog::TermLogger::init(
        log::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Always,
    )
    .unwrap();

    let ports = serial::find_ports()?;
    let mut args = std::env::args().skip(1);

    let port_name = match args.next().as_deref() {
        None => {
            let Some(port) = ports.first() else {
                error!("There are no serial ports available.");
                return Ok(());
            };
            port.port_name.clone()
        }
        Some("--list") => {
            if ports.is_empty() {
                println!("There are no serial ports available.");
            }
            for port in &ports {
                println!("{} | {}", port.port_name, port.description);
            }
            return Ok(());
        }
        Some("-p" | "--port") => {
            let Some(name) = args.next() else {
                error!("A port must be specified");
                return Ok(());
            };
            if !ports.iter().any(|port| port.port_name == name) {
                error!("No serial port named {name:?}");
                return Ok(());
            }
            name
        }
        Some(other) => {
            error!("Unknown argument {other:?}");
            return Ok(());
        }
    };

    info!("Using: {port_name}");

    let transport = SerialTransport::open(&port_name, DeviceType::JoystickPartnerPort)?;
    let mut connection = Connection::new(transport);

    let neutral = ControllerStatus::NEUTRAL.to_packet();

    loop {
        sleep(Duration::from_millis(100));
        for _ in 0..200 {
            connection.send(&neutral)?;
            sleep(Duration::from_millis(1));
        }

        if let Some(packet) = connection.try_recv()? {
            println!("{packet}");
        }
    }
}
