// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Generated wire types for the scaf gRPC API.
//!
//! The module tree mirrors the proto package hierarchy so that
//! cross-package references in the generated code resolve.

mod generated {
    pub mod yhlooo {
        pub mod com {
            pub mod scaf {
                pub mod meta {
                    pub mod v1 {
                        tonic::include_proto!("yhlooo.com.scaf.meta.v1");
                    }
                }
                pub mod authn {
                    pub mod v1 {
                        tonic::include_proto!("yhlooo.com.scaf.authn.v1");
                    }
                }
                pub mod stream {
                    pub mod v1 {
                        tonic::include_proto!("yhlooo.com.scaf.stream.v1");
                    }
                }
            }
        }
    }
}

pub use generated::yhlooo::com::scaf::{authn, meta, stream};
