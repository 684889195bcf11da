use bacwire_core::apdu::{Apdu, UnconfirmedRequest};
use bacwire_core::npdu::NpduAddress;
use bacwire_core::services::{UnconfirmedServiceRequest, WhoIsRequest};
use bacwire_core::Npdu;
use bacwire_datalink::bip::transport::MAX_BIP_FRAME_LEN;
use bacwire_datalink::{BacnetIpTransport, Bvlc, DataLink, DataLinkAddress};
use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

#[derive(Parser, Debug)]
#[command(name = "bacnet-whois")]
struct Args {
    #[arg(long, default_value_t = 3)]
    timeout_secs: u64,
    /// Local address to bind.
    #[arg(long, default_value_t = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0))]
    bind: SocketAddr,
    /// Where to send the request; the local broadcast address by default.
    #[arg(long)]
    target: Option<SocketAddr>,
    #[arg(long)]
    low: Option<u32>,
    #[arg(long)]
    high: Option<u32>,
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let request = match (args.low, args.high) {
        (Some(low), Some(high)) => WhoIsRequest::range(low, high),
        (None, None) => WhoIsRequest::global(),
        _ => return Err("--low and --high must be given together".into()),
    };
    let npdu = Npdu::application(Apdu::UnconfirmedRequest(UnconfirmedRequest::new(
        UnconfirmedServiceRequest::WhoIs(request),
    )))
    .to_remote(NpduAddress::broadcast(0xFFFF));

    let transport = BacnetIpTransport::bind(args.bind).await?;
    let (target, frame) = match args.target {
        Some(addr) => (DataLinkAddress::Ip(addr), Bvlc::OriginalUnicastNpdu(npdu)),
        None => (
            DataLinkAddress::local_broadcast(DataLinkAddress::BACNET_IP_DEFAULT_PORT),
            Bvlc::OriginalBroadcastNpdu(npdu),
        ),
    };
    transport.send_bvlc(target, &frame).await?;

    let deadline = Instant::now() + Duration::from_secs(args.timeout_secs);
    let mut buf = [0u8; MAX_BIP_FRAME_LEN];
    let mut found = 0usize;
    loop {
        let (frame, source) = match timeout_at(deadline, transport.recv_bvlc(&mut buf)).await {
            Err(_) => break,
            Ok(Ok(received)) => received,
            Ok(Err(e)) => {
                log::debug!("ignoring frame: {e}");
                continue;
            }
        };
        let Some(npdu) = frame.npdu() else { continue };
        let Some(Apdu::UnconfirmedRequest(UnconfirmedRequest {
            service: UnconfirmedServiceRequest::IAm(i_am),
        })) = npdu.apdu()
        else {
            continue;
        };

        found += 1;
        if args.json {
            println!("{}", serde_json::to_string(i_am)?);
            continue;
        }
        let via = match &npdu.source {
            Some(routed) => match DataLinkAddress::from_bip_mac(&routed.mac) {
                Some(mac) => format!(" (network {} station {mac})", routed.network),
                None => format!(" (network {} mac {:02x?})", routed.network, routed.mac),
            },
            None => String::new(),
        };
        println!(
            "{source}{via}: device {} vendor {} max-apdu {} segmentation {:?}",
            i_am.object_instance_number,
            i_am.vendor_id,
            i_am.max_apdu_accepted,
            i_am.segmentation_supported
        );
    }
    log::info!("{found} device(s) answered");
    Ok(())
}
