// Copyright (C) 2025 Monarch Contributors
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Wire messages and the point-to-point transport connecting the debug
//! controller to remote pdb shims and to the external CLI front-end.

pub mod actor_id;
pub mod messages;
pub mod transport;

pub use actor_id::ActorId;
pub use messages::{
    mk_session_end, mk_session_start, CliToControllerMessage, ControllerReply, ControllerRequest,
    ControllerToCliReply, ControllerToWorkerReply, WorkerToControllerMessage,
};
pub use transport::{RpcClient, TransportError};

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    #[tokio::test]
    async fn frame_round_trips_over_a_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let msg: WorkerToControllerMessage = transport::read_frame(&mut stream).await.unwrap();
            transport::write_frame(&mut stream, &msg).await.unwrap();
        });

        let mut client = TcpStream::connect(addr).await.unwrap();
        let sent = mk_session_start(0, Default::default(), "hostA".into(), "debugee".into());
        transport::write_frame(&mut client, &sent).await.unwrap();
        let echoed: WorkerToControllerMessage = transport::read_frame(&mut client).await.unwrap();

        match echoed {
            WorkerToControllerMessage::DebuggerSessionStart { rank, hostname, actor_name, .. } => {
                assert_eq!(rank, 0);
                assert_eq!(hostname, "hostA");
                assert_eq!(actor_name, "debugee");
            }
            _ => panic!("unexpected message"),
        }
        server.await.unwrap();
    }
}
