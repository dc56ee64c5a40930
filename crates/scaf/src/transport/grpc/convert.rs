// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversions between API DTOs and generated proto types.

use tonic::Status;

use crate::api::meta::ObjectMeta;
use crate::api::proto;
use crate::api::{authn, meta, stream};

pub fn object_meta_from_proto(meta: Option<proto::meta::v1::ObjectMeta>) -> ObjectMeta {
    let Some(meta) = meta else {
        return ObjectMeta::default();
    };
    ObjectMeta {
        name: meta.name,
        uid: meta.uid,
        annotations: meta.annotations,
        owners: meta.owners,
    }
}

pub fn object_meta_to_proto(meta: ObjectMeta) -> Option<proto::meta::v1::ObjectMeta> {
    Some(proto::meta::v1::ObjectMeta {
        name: meta.name,
        uid: meta.uid,
        annotations: meta.annotations,
        owners: meta.owners,
    })
}

pub fn status_to_proto(status: meta::Status) -> proto::meta::v1::Status {
    proto::meta::v1::Status {
        code: status.code,
        reason: status.reason,
        message: status.message,
    }
}

pub fn token_request_from_proto(req: proto::authn::v1::TokenRequest) -> authn::TokenRequest {
    authn::TokenRequest {
        metadata: object_meta_from_proto(req.metadata),
        status: authn::TokenRequestStatus {
            token: req.status.map(|status| status.token).unwrap_or_default(),
        },
    }
}

pub fn token_request_to_proto(req: authn::TokenRequest) -> proto::authn::v1::TokenRequest {
    proto::authn::v1::TokenRequest {
        metadata: object_meta_to_proto(req.metadata),
        status: Some(proto::authn::v1::TokenRequestStatus { token: req.status.token }),
    }
}

pub fn self_subject_review_to_proto(
    review: authn::SelfSubjectReview,
) -> proto::authn::v1::SelfSubjectReview {
    proto::authn::v1::SelfSubjectReview {
        metadata: object_meta_to_proto(review.metadata),
        status: Some(proto::authn::v1::SelfSubjectReviewStatus {
            user_info: Some(proto::authn::v1::UserInfo {
                username: review.status.user_info.username,
            }),
        }),
    }
}

/// Parse a proto stream into the DTO. An unknown stop policy is a client
/// error.
pub fn stream_from_proto(s: proto::stream::v1::Stream) -> Result<stream::Stream, Status> {
    let policy_name = s.spec.map(|spec| spec.stop_policy).unwrap_or_default();
    let stop_policy = stream::StopPolicy::parse(&policy_name).ok_or_else(|| {
        Status::invalid_argument(format!("unknown stop policy: {policy_name:?}"))
    })?;
    Ok(stream::Stream {
        metadata: object_meta_from_proto(s.metadata),
        spec: stream::StreamSpec { stop_policy },
        status: stream::StreamStatus {
            token: s.status.map(|status| status.token).unwrap_or_default(),
        },
    })
}

pub fn stream_to_proto(s: stream::Stream) -> proto::stream::v1::Stream {
    proto::stream::v1::Stream {
        metadata: object_meta_to_proto(s.metadata),
        spec: Some(proto::stream::v1::StreamSpec {
            stop_policy: s.spec.stop_policy.as_str().to_owned(),
        }),
        status: Some(proto::stream::v1::StreamStatus { token: s.status.token }),
    }
}

pub fn stream_list_to_proto(list: stream::StreamList) -> proto::stream::v1::StreamList {
    proto::stream::v1::StreamList {
        items: list.items.into_iter().map(stream_to_proto).collect(),
    }
}
