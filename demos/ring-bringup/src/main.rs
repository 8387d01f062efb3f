// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Worked VOTF example.
//!
//! Brings a simulated ring device up from a platform description, runs
//! the full channel lifecycle — link, rendezvous, flush, teardown — and
//! finishes by staging and recovering a token-rendezvous deadlock with
//! the diagnostic probe.

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::info;
use votf_config::RingConf;
use votf_hw::test_helpers::SimRingHw;
use votf_ring::device::{DeviceSet, RingDevice};
use votf_ring::resolver::RegCandidates;
use votf_ring::types::{
    CfgOption, EndpointId, FlushPoll, Service, ServiceCfg, TrsLostCfg,
};

const DEFAULT_CONF: &str = include_str!("../votf.toml");

/// Command-line arguments.
#[derive(Parser)]
#[command(about = "VOTF ring bring-up demo")]
struct Cli {
    /// Path to an alternative platform description (TOML).
    #[arg(long)]
    conf: Option<PathBuf>,

    /// Level of log message to display.
    #[arg(long, default_value = "Info")]
    stdout_level: log::Level,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.stdout_level.to_level_filter())
        .init();

    let conf = match &cli.conf {
        Some(path) => RingConf::from_file(path)?,
        None => RingConf::from_toml_str(DEFAULT_CONF)?,
    };
    let device_conf = conf
        .device("votf0")
        .ok_or("platform description has no votf0 device")?;

    let hw = Arc::new(SimRingHw::new());
    let device = Arc::new(RingDevice::new(
        &device_conf.name,
        &device_conf.slots()?,
        hw.clone(),
        FlushPoll::default(),
    )?);
    let mut devices = DeviceSet::new();
    devices.push(device.clone());

    // Device-wide bring-up, then the IP pair.
    device.create_ring()?;
    device.create_link(2, 5)?;

    let tws = EndpointId::new(Service::Tws, 2, 0);
    let trs = EndpointId::new(Service::Trs, 5, 0);
    let cfg = ServiceCfg {
        enable: true,
        limit: 2,
        token_size: 4,
        connected_ip: 5,
        connected_id: 0,
        option: CfgOption {
            count: true,
            change: false,
        },
        width: 1920,
        height: 1080,
        bitwidth: 10,
    };

    device.set_service_cfg(&tws, &cfg)?;
    info!(
        "after one side: {} is {}, {} is {}",
        tws,
        device.pair_state(&tws)?,
        trs,
        device.pair_state(&trs)?
    );

    let mut peer_cfg = cfg.clone();
    peer_cfg.connected_ip = 2;
    device.set_service_cfg(&trs, &peer_cfg)?;
    device.set_trs_lost_cfg(
        &trs,
        &TrsLostCfg {
            recover: true,
            flush: false,
        },
    )?;
    info!(
        "after both sides: {} is {}, {} is {}",
        tws,
        device.pair_state(&tws)?,
        trs,
        device.pair_state(&trs)?
    );

    // Normal teardown of the channel pair.
    device.set_flush(&tws)?;
    info!("{} flushed, now {}", tws, device.pair_state(&tws)?);

    // Stage a mutual wait-connection deadlock in the simulated hardware
    // and let the probe break it.
    let src_debug = device.reg_addr(&tws, &RegCandidates::debug())?;
    let dst_debug = device.reg_addr(&trs, &RegCandidates::debug())?;
    hw.poke(src_debug, 1);
    hw.poke(dst_debug, 1);
    device.check_wait_con(&tws, &trs)?;
    info!("deadlock probe issued {} reject(s)", hw.reject_tokens());

    device.destroy_link(2, 5)?;
    device.destroy_ring()?;
    devices.disable_service();
    info!("ring torn down, {} module ring destroys", hw.ring_destroys());
    Ok(())
}
