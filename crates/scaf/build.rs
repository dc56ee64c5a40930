// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }
    tonic_prost_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "../../proto/scaf/v1/meta.proto",
                "../../proto/scaf/v1/authn.proto",
                "../../proto/scaf/v1/stream.proto",
            ],
            &["../../proto"],
        )?;
    Ok(())
}
