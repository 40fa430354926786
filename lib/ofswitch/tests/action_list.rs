// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2025 Oxide Computer Company

//! Integration tests for applying action lists.

use ofswitch_test_utils::*;

// Decrementing a live IPv4 TTL and outputting the packet works end to
// end, and the output snapshot carries the decremented TTL.
#[test]
fn dec_nw_ttl_then_output() {
    let dp = TestDatapath::new();
    let actions = [Action::DecNwTtl, Action::Output { port: PortNo::Port(3) }];

    let (out, effects) =
        dp.apply_list(pkt(vec![eth(), ipv4(1)]), &actions).unwrap();

    assert_eq!(ttls(&out.headers), [0]);
    assert_eq!(
        effects,
        [SideEffect::Output { port: PortNo::Port(3), packet: out.clone() }]
    );
    assert_eq!(dp.ports.sent(), [(PortNo::Port(3), out)]);
}

// A zero TTL aborts the list: the controller gets exactly one copy of
// the packet and the output after the decrement never happens.
#[test]
fn dec_nw_ttl_at_zero_redirects_to_controller() {
    let dp = TestDatapath::new();
    let actions = [Action::DecNwTtl, Action::Output { port: PortNo::Port(3) }];

    let res = dp.apply_list(pkt(vec![eth(), ipv4(0)]), &actions);
    assert_eq!(res, Err(ActionError::InvalidTtl(TtlHeader::Ipv4)));

    let sent = dp.ports.sent();
    assert_eq!(sent.len(), 1);
    let (dst, copy) = &sent[0];
    assert_eq!(*dst, PortNo::Controller);
    assert_eq!(copy.packet_in_reason, Some(PacketInReason::InvalidTtl));
    assert_eq!(ttls(&copy.headers), [0]);
    assert_eq!(copy.in_port(), IN_PORT);

    let notes = dp.log.at(LogLevel::Note);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].starts_with("InvalidTtl/Ipv4"), "{}", notes[0]);
}

#[test]
fn dec_mpls_ttl_at_zero_redirects_to_controller() {
    let dp = TestDatapath::new();
    let actions = [
        Action::SetQueue { queue_id: 4 },
        Action::DecMplsTtl,
        Action::PopMpls,
        Action::Group { group_id: GroupId(1) },
    ];

    let res = dp.apply_list(pkt(vec![eth(), mpls(&[0, 7]), ipv4(9)]), &actions);
    assert_eq!(res, Err(ActionError::InvalidTtl(TtlHeader::Mpls)));

    let to_ctl = dp.ports.sent_to(PortNo::Controller);
    assert_eq!(to_ctl.len(), 1);
    // Actions before the decrement had taken effect, the rest had not.
    assert_eq!(to_ctl[0].queue_id, Some(4));
    assert_eq!(ttls(&to_ctl[0].headers), [0, 7, 9]);
    assert!(dp.groups.applied().is_empty());
}

#[test]
fn redirect_honors_configured_controller() {
    let cfg: ActionCfg = ron::from_str("(controller: Port(4000))").unwrap();
    let dp = TestDatapath::with_cfg(cfg);

    let res = dp.apply_list(pkt(vec![eth(), ipv4(0)]), &[Action::DecNwTtl]);
    assert!(res.is_err());
    assert_eq!(dp.ports.sent_to(PortNo::Port(4000)).len(), 1);
    assert!(dp.ports.sent_to(PortNo::Controller).is_empty());
}

// MPLS actions other than push leave a packet without MPLS alone.
#[test]
fn mpls_actions_without_mpls_header() {
    let dp = TestDatapath::new();
    let orig = pkt(vec![eth(), vlan(10, 1), ipv4(64)]);

    for action in [
        Action::SetMplsTtl { ttl: 5 },
        Action::DecMplsTtl,
        Action::PopMpls,
        Action::SetField { field: SetField::MplsLabel(99) },
    ] {
        let (out, effects) = dp.apply_list(orig.clone(), &[action]).unwrap();
        assert_eq!(out, orig, "{action}");
        assert!(effects.is_empty());
    }

    let (out, _) = dp
        .apply_list(orig.clone(), &[Action::PushMpls { ether_type: 0x8847 }])
        .unwrap();
    assert_eq!(
        kinds(&out.headers),
        [HeaderKind::Ether, HeaderKind::Vlan, HeaderKind::Mpls, HeaderKind::Ipv4]
    );
    assert_eq!(ttls(&out.headers), [64, 64]);
}

#[test]
fn push_pop_mpls_round_trip() {
    let dp = TestDatapath::new();
    let actions =
        [Action::PushMpls { ether_type: ETHER_TYPE_MPLS }, Action::PopMpls];

    for tags in [
        vec![eth(), ipv4(64)],
        vec![eth(), vlan(3, 0), ipv4(64)],
        vec![eth(), mpls(&[12]), ipv4(64)],
        vec![eth(), mpls(&[12, 40]), ipv4(64)],
    ] {
        let orig = pkt(tags);
        let (out, _) = dp.apply_list(orig.clone(), &actions).unwrap();
        assert_eq!(out.headers, orig.headers);
    }
}

#[test]
fn push_vlan_without_existing_tag_uses_defaults() {
    let dp = TestDatapath::new();
    let (out, _) = dp
        .apply_list(
            pkt(vec![eth(), ipv4(64)]),
            &[Action::PushVlan { ether_type: ETHER_TYPE_VLAN }],
        )
        .unwrap();

    assert_eq!(out.headers.tags(), &[eth(), vlan(1, 0), ipv4(64)]);
}

#[test]
fn push_vlan_defaults_from_config() {
    let cfg: ActionCfg =
        ron::from_str("(vlan_defaults: (vid: 100, pcp: 5))").unwrap();
    let dp = TestDatapath::with_cfg(cfg);
    let (out, _) = dp
        .apply_list(
            pkt(vec![eth(), ipv4(64)]),
            &[Action::PushVlan { ether_type: ETHER_TYPE_VLAN }],
        )
        .unwrap();

    assert_eq!(out.headers.tags()[1], vlan(100, 5));
}

#[test]
fn push_pop_vlan() {
    let dp = TestDatapath::new();
    let actions =
        [Action::PushVlan { ether_type: ETHER_TYPE_QINQ }, Action::PopVlan];

    let orig = pkt(vec![eth(), ipv4(64)]);
    let (out, _) = dp.apply_list(orig.clone(), &actions).unwrap();
    assert_eq!(out, orig);

    // The pushed tag is the one popped; the original stays.
    let orig = pkt(vec![eth(), vlan(20, 2), ipv4(64)]);
    let (out, _) = dp
        .apply_list(
            orig.clone(),
            &[
                Action::PushVlan { ether_type: ETHER_TYPE_QINQ },
                Action::SetField { field: SetField::VlanVid(30) },
                Action::PopVlan,
            ],
        )
        .unwrap();
    assert_eq!(out, orig);
}

#[test]
fn copy_ttl_out_then_in_on_label_stack() {
    let dp = TestDatapath::new();
    let orig = pkt(vec![eth(), mpls(&[10, 20]), ipv4(64)]);

    let (out, _) = dp.apply_list(orig, &[Action::CopyTtlOut]).unwrap();
    assert_eq!(ttls(&out.headers), [20, 20, 64]);

    let (out, _) = dp.apply_list(out, &[Action::CopyTtlIn]).unwrap();
    assert_eq!(ttls(&out.headers), [20, 20, 64]);
}

#[test]
fn copy_ttl_in_targets_inner_ipv4() {
    let dp = TestDatapath::new();
    let orig = pkt(vec![eth(), ipv4(10), ipv4(20)]);

    let (out, _) = dp.apply_list(orig, &[Action::CopyTtlIn]).unwrap();
    assert_eq!(ttls(&out.headers), [10, 10]);
}

#[test]
fn copy_ttl_on_undefined_layout() {
    let dp = TestDatapath::new();
    let orig = pkt(vec![eth(), ipv4(10)]);

    let (out, _) =
        dp.apply_list(orig.clone(), &[Action::CopyTtlOut, Action::CopyTtlIn])
            .unwrap();
    assert_eq!(out, orig);
    let notes = dp.log.at(LogLevel::Note);
    assert_eq!(notes.len(), 2);
    assert_eq!(
        notes[0],
        "copy_ttl_out undefined for headers [ETHER/IPv4], ignored"
    );
    assert!(notes[1].starts_with("copy_ttl_in"));

    let cfg: ActionCfg =
        ron::from_str("(log_undefined_copy_ttl: false)").unwrap();
    let dp = TestDatapath::with_cfg(cfg);
    let (out, _) = dp.apply_list(orig.clone(), &[Action::CopyTtlOut]).unwrap();
    assert_eq!(out, orig);
    assert!(dp.log.entries().is_empty());
}

// Each output sees the packet as the actions before it left it.
#[test]
fn outputs_snapshot_packet_in_order() {
    let dp = TestDatapath::new();
    let actions = [
        Action::Output { port: PortNo::Port(1) },
        Action::PushVlan { ether_type: ETHER_TYPE_VLAN },
        Action::SetField { field: SetField::VlanVid(42) },
        Action::Group { group_id: GroupId(7) },
        Action::SetNwTtl { ttl: 3 },
        Action::SetQueue { queue_id: 2 },
        Action::Experimenter { id: 0x2320 },
        Action::Output { port: PortNo::Flood },
    ];

    let (out, effects) =
        dp.apply_list(pkt(vec![eth(), ipv4(64)]), &actions).unwrap();

    assert_eq!(effects.len(), 3);
    assert_eq!(effects[0].packet().headers.tags(), &[eth(), ipv4(64)]);
    let SideEffect::GroupApply { group_id, packet } = &effects[1] else {
        panic!("expected group: {}", effects[1]);
    };
    assert_eq!(*group_id, GroupId(7));
    assert_eq!(packet.headers.tags(), &[eth(), vlan(42, 0), ipv4(64)]);
    assert_eq!(effects[2].packet(), &out);
    assert_eq!(out.queue_id, Some(2));
    assert_eq!(ttls(&out.headers), [3]);

    assert_eq!(dp.groups.applied(), [(GroupId(7), packet.clone())]);
    let dsts: Vec<PortNo> = dp.ports.sent().into_iter().map(|(p, _)| p).collect();
    assert_eq!(dsts, [PortNo::Port(1), PortNo::Flood]);
}

#[test]
fn set_field_rewrites_addresses() {
    let dp = TestDatapath::new();
    let new_dst: Ipv4Addr = "172.30.0.1".parse().unwrap();
    let new_mac: MacAddr = "02:00:00:00:00:09".parse().unwrap();

    let (out, _) = dp
        .apply_list(
            pkt(vec![eth(), ipv4(64)]),
            &[
                Action::SetField { field: SetField::Ipv4Dst(new_dst) },
                Action::SetField { field: SetField::EthDst(new_mac) },
                Action::SetField { field: SetField::IpDscp(46) },
            ],
        )
        .unwrap();

    let HeaderTag::Ether(e) = &out.headers.tags()[0] else { panic!() };
    assert_eq!(e.dst, new_mac);
    let HeaderTag::Ipv4(ip) = &out.headers.tags()[1] else { panic!() };
    assert_eq!(ip.dst, new_dst);
    assert_eq!(ip.src, GUEST_IP);
    assert_eq!(ip.dscp, 46);
}

#[test]
fn bad_port_is_logged_not_fatal() {
    let ports = RecordingPorts::with_bad_ports(&[PortNo::Port(9)]);
    let dp = TestDatapath::with_parts(ActionCfg::default(), ports);
    let actions = [
        Action::Output { port: PortNo::Port(9) },
        Action::Output { port: PortNo::Port(2) },
    ];

    let (_, effects) =
        dp.apply_list(pkt(vec![eth(), ipv4(64)]), &actions).unwrap();

    assert_eq!(effects.len(), 2);
    assert_eq!(dp.ports.sent().len(), 1);
    let warns = dp.log.at(LogLevel::Warn);
    assert_eq!(warns.len(), 1);
    assert!(warns[0].contains("no such port: 9"), "{}", warns[0]);
}
