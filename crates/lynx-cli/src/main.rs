use anyhow::{anyhow, bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lynx_abi::bytes::{compare_region, hton16};
use lynx_abi::layout::LAYOUT;
use lynx_abi::{Buffer, BufferMut, Context, Endpoint, Ipv4Address, Ipv6Address, Socket};
use lynx_sys::{LoopbackConfig, LoopbackProvider, Sys};
use rand::RngCore;
use std::time::Duration;

const RECV_MEMORY: usize = 1408;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Family {
    V4,
    V6,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the size and field offsets of every shared structure
    Layout,
    /// Bounce a random datagram between two loopback sockets
    Echo {
        /// Server port; the client binds the next one
        #[arg(long, default_value_t = 51343)]
        port: u16,

        /// Payload size in bytes
        #[arg(long, default_value_t = 1235)]
        payload: usize,

        /// Address family of both endpoints
        #[arg(long, value_enum, default_value_t = Family::V4)]
        family: Family,

        /// Receive timeout in milliseconds, 0 waits forever
        #[arg(long, default_value_t = 1000)]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Layout => print_layout(),
        Commands::Echo {
            port,
            payload,
            family,
            timeout,
        } => {
            let recv_timeout = (timeout > 0).then(|| Duration::from_millis(timeout));
            let sys = Sys::new(LoopbackProvider::new(LoopbackConfig {
                recv_timeout,
                ..LoopbackConfig::default()
            }));

            let mut ctx = Context::new();
            sys.setup(&mut ctx).context("provider setup")?;
            let result = echo(&sys, &ctx, port, payload, family);
            sys.cleanup(&mut ctx).context("provider cleanup")?;
            result?;

            println!("Echo completed.");
        }
    }

    Ok(())
}

fn print_layout() {
    for entry in LAYOUT {
        println!("{:<10} size {:>3}  align {}", entry.name, entry.size, entry.align);
        for field in entry.fields {
            println!("  {:<10} @{:<3} {:>2} bytes", field.name, field.offset, field.size);
        }
    }
}

fn endpoint(ctx: &Context, family: Family, port: u16) -> Endpoint {
    match family {
        Family::V4 => ctx.endpoint_v4(hton16(port), Ipv4Address::LOCALHOST),
        Family::V6 => ctx.endpoint_v6(hton16(port), Ipv6Address::LOCALHOST, 0, 0),
    }
}

fn echo(sys: &Sys<LoopbackProvider>, ctx: &Context, port: u16, payload: usize, family: Family) -> Result<()> {
    let client_port = port
        .checked_add(1)
        .ok_or_else(|| anyhow!("port {} leaves no room for the client", port))?;

    let mut server = Socket::new_udp(endpoint(ctx, family, port));
    let mut client = Socket::new_udp(endpoint(ctx, family, client_port));
    sys.open(&mut server).context("open server socket")?;
    sys.open(&mut client).context("open client socket")?;

    let server_addr = server.endpoint.to_socket_addr(ctx);
    let client_addr = client.endpoint.to_socket_addr(ctx);
    println!("Server bound to {:?}, client bound to {:?}", server_addr, client_addr);

    let mut request = vec![0u8; payload];
    rand::thread_rng().fill_bytes(&mut request);

    bounce(sys, &mut client, &mut server, &request).context("client to server")?;
    println!("Server received {} bytes from client", request.len());
    bounce(sys, &mut server, &mut client, &request).context("server to client")?;
    println!("Client received {} bytes back from server", request.len());

    sys.close(&mut server).context("close server socket")?;
    sys.close(&mut client).context("close client socket")?;
    Ok(())
}

fn bounce(sys: &Sys<LoopbackProvider>, from: &mut Socket, to: &mut Socket, payload: &[u8]) -> Result<()> {
    let sent = sys.send(from, &[Buffer::for_send(payload)], &to.endpoint)?;
    if sent != payload.len() {
        bail!("sent {} of {} bytes", sent, payload.len());
    }

    let mut memory = vec![0u8; payload.len().max(RECV_MEMORY)];
    let mut source = Endpoint::zeroed();
    let received = sys.recv(to, &mut [BufferMut::for_recv(&mut memory)], &mut source)?;
    log::debug!("received {} bytes from {:?}", received, source);

    if received != payload.len() || !compare_region(&memory, 0, payload, 0, received) {
        bail!("payload corrupted in transit ({} of {} bytes)", received, payload.len());
    }
    if !source.bytes_eq_from(&from.endpoint, 2) {
        bail!("datagram reported the wrong source endpoint");
    }
    Ok(())
}
